//! Job Entity
//!
//! A customer's repair request, its lifecycle status and the ordered
//! timeline of what happened to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::professional::Professional;
use super::validation::{
    validate_budget, validate_job_description, validate_job_title, validate_location,
    validate_schedule, FormErrors,
};

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    Draft,
    /// Waiting for a professional
    #[default]
    Matching,
    Assigned,
    InProgress,
    AwaitingReview,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Matching => "matching",
            JobStatus::Assigned => "assigned",
            JobStatus::InProgress => "inProgress",
            JobStatus::AwaitingReview => "awaitingReview",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "draft" => JobStatus::Draft,
            "assigned" => JobStatus::Assigned,
            "inProgress" => JobStatus::InProgress,
            "awaitingReview" => JobStatus::AwaitingReview,
            "completed" => JobStatus::Completed,
            "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Matching,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "urgent" => Urgency::Urgent,
            _ => Urgency::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    #[default]
    Created,
    Update,
    Message,
    Photo,
    Completed,
}

impl TimelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineKind::Created => "created",
            TimelineKind::Update => "update",
            TimelineKind::Message => "message",
            TimelineKind::Photo => "photo",
            TimelineKind::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "update" => TimelineKind::Update,
            "message" => TimelineKind::Message,
            "photo" => TimelineKind::Photo,
            "completed" => TimelineKind::Completed,
            _ => TimelineKind::Created,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
    De,
}

/// One summary per supported locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocalizedText {
    pub zh: String,
    pub en: String,
    pub de: String,
}

impl LocalizedText {
    pub fn new(zh: impl Into<String>, en: impl Into<String>, de: impl Into<String>) -> Self {
        Self {
            zh: zh.into(),
            en: en.into(),
            de: de.into(),
        }
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Zh => &self.zh,
            Locale::En => &self.en,
            Locale::De => &self.de,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub kind: TimelineKind,
    pub summary: LocalizedText,
}

impl TimelineEntry {
    pub fn new(kind: TimelineKind, summary: LocalizedText, date: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            kind,
            summary,
        }
    }
}

/// A repair request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub preferred_schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
    pub urgency: Urgency,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_professional_id: Option<String>,
    /// Oldest entry first
    pub timeline: Vec<TimelineEntry>,
}

impl Job {
    /// Hand the job to a professional and record it on the timeline
    pub fn assign(&mut self, professional: &Professional, now: DateTime<Utc>) {
        let name = &professional.name;
        self.status = JobStatus::Assigned;
        self.assigned_professional_id = Some(professional.id.clone());
        self.timeline.push(TimelineEntry::new(
            TimelineKind::Update,
            LocalizedText::new(
                format!("{} 已指派", name),
                format!("{} assigned", name),
                format!("{} zugewiesen", name),
            ),
            now,
        ));
    }

    /// Case-insensitive match on title or location
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.title.to_lowercase().contains(&term)
            || self.location.to_lowercase().contains(&term)
    }
}

impl Entity for Job {
    const KIND: &'static str = "Job";
    type Id = str;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial update applied by `JobCommands::update`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub preferred_schedule: Option<String>,
    /// `Some(None)` removes the budget
    pub budget_range: Option<Option<String>>,
    pub urgency: Option<Urgency>,
    pub status: Option<JobStatus>,
    /// `Some(None)` unassigns
    pub assigned_professional_id: Option<Option<String>>,
    pub timeline: Option<Vec<TimelineEntry>>,
}

impl JobUpdate {
    pub fn apply(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(location) = self.location {
            job.location = location;
        }
        if let Some(schedule) = self.preferred_schedule {
            job.preferred_schedule = schedule;
        }
        if let Some(budget) = self.budget_range {
            job.budget_range = budget;
        }
        if let Some(urgency) = self.urgency {
            job.urgency = urgency;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(assigned) = self.assigned_professional_id {
            job.assigned_professional_id = assigned;
        }
        if let Some(timeline) = self.timeline {
            job.timeline = timeline;
        }
    }
}

/// Raw input of the "new job" form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobForm {
    pub title: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub preferred_schedule: String,
    pub budget_range: String,
    pub urgency: Urgency,
}

impl JobForm {
    /// Run every field check, collecting all failures
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(validate_job_title(&self.title));
        errors.check(validate_job_description(&self.description));
        errors.check(validate_location(&self.location));
        errors.check(validate_schedule(&self.preferred_schedule));
        errors.check(validate_budget(&self.budget_range));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build a new job awaiting a professional
    pub fn into_job(self, now: DateTime<Utc>) -> Result<Job, FormErrors> {
        self.validate()?;

        let budget = self.budget_range.trim();
        Ok(Job {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            category: self.category,
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            preferred_schedule: self.preferred_schedule.trim().to_string(),
            budget_range: (!budget.is_empty()).then(|| budget.to_string()),
            urgency: self.urgency,
            status: JobStatus::Matching,
            assigned_professional_id: None,
            timeline: vec![TimelineEntry::new(
                TimelineKind::Created,
                LocalizedText::new("工單建立", "Request created", "Anfrage erstellt"),
                now,
            )],
        })
    }
}
