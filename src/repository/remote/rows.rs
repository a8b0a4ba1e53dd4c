//! Remote Table Rows
//!
//! Loosely-typed rows as the REST backend returns them, and the mapping
//! into domain records. Missing or unknown values get defaults here so the
//! rest of the crate only ever sees fully-typed records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::{Job, JobStatus, LocalizedText, Task, TimelineEntry, TimelineKind, Urgency};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoRow {
    pub id: Option<String>,
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub created_at: Option<String>,
}

impl TodoRow {
    /// The row in the task JSON shape, for the structural guard
    pub fn to_task_value(&self) -> Value {
        let mut obj = serde_json::Map::new();
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), Value::from(id.clone()));
        }
        if let Some(text) = &self.text {
            obj.insert("text".to_string(), Value::from(text.clone()));
        }
        if let Some(completed) = self.completed {
            obj.insert("completed".to_string(), Value::from(completed));
        }
        if let Some(created_at) = &self.created_at {
            obj.insert("createdAt".to_string(), Value::from(created_at.clone()));
        }
        Value::Object(obj)
    }
}

impl From<&Task> for TodoRow {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            text: Some(task.text.clone()),
            completed: Some(task.completed),
            created_at: Some(task.created_at.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRow {
    pub id: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub preferred_schedule: Option<String>,
    pub budget_range: Option<String>,
    pub urgency: Option<String>,
    pub status: Option<String>,
    pub assigned_professional_id: Option<String>,
    /// Index in the job list
    #[serde(default)]
    pub position: Option<i64>,
    /// Embedded by `select=*,timeline_entries(*)`
    #[serde(default, skip_serializing)]
    pub timeline_entries: Vec<TimelineRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub id: Option<String>,
    pub job_id: Option<String>,
    pub kind: Option<String>,
    pub summary_zh: Option<String>,
    pub summary_en: Option<String>,
    pub summary_de: Option<String>,
    pub date: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TimelineRow {
    pub fn from_entry(job_id: &str, entry: &TimelineEntry) -> Self {
        Self {
            id: Some(entry.id.clone()),
            job_id: Some(job_id.to_string()),
            kind: Some(entry.kind.as_str().to_string()),
            summary_zh: Some(entry.summary.zh.clone()),
            summary_en: Some(entry.summary.en.clone()),
            summary_de: Some(entry.summary.de.clone()),
            date: Some(entry.date.to_rfc3339()),
        }
    }

    /// `None` when the row has no id or no parseable date
    pub fn into_entry(self) -> Option<TimelineEntry> {
        let id = non_empty(self.id)?;
        let date = self
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())?
            .with_timezone(&Utc);

        Some(TimelineEntry {
            id,
            date,
            kind: TimelineKind::from_str(self.kind.as_deref().unwrap_or_default()),
            summary: LocalizedText {
                zh: self.summary_zh.unwrap_or_default(),
                en: self.summary_en.unwrap_or_default(),
                de: self.summary_de.unwrap_or_default(),
            },
        })
    }
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: Some(job.id.clone()),
            title: Some(job.title.clone()),
            category: Some(job.category.clone()),
            description: Some(job.description.clone()),
            location: Some(job.location.clone()),
            preferred_schedule: Some(job.preferred_schedule.clone()),
            budget_range: job.budget_range.clone(),
            urgency: Some(job.urgency.as_str().to_string()),
            status: Some(job.status.as_str().to_string()),
            assigned_professional_id: job.assigned_professional_id.clone(),
            position: None,
            timeline_entries: Vec::new(),
        }
    }
}

impl JobRow {
    /// Map to a `Job`; rows without id or title are rejected
    pub fn into_job(self) -> Option<Job> {
        let id = non_empty(self.id)?;
        let Some(title) = non_empty(self.title) else {
            warn!(job_id = %id, "Skipping remote job without title");
            return None;
        };

        let mut timeline: Vec<TimelineEntry> = Vec::with_capacity(self.timeline_entries.len());
        for row in self.timeline_entries {
            match row.into_entry() {
                Some(entry) => timeline.push(entry),
                None => warn!(job_id = %id, "Skipping malformed timeline entry"),
            }
        }
        timeline.sort_by_key(|entry| entry.date);

        Some(Job {
            id,
            title,
            category: self.category.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            preferred_schedule: self.preferred_schedule.unwrap_or_default(),
            budget_range: non_empty(self.budget_range),
            urgency: Urgency::from_str(self.urgency.as_deref().unwrap_or_default()),
            status: JobStatus::from_str(self.status.as_deref().unwrap_or_default()),
            assigned_professional_id: non_empty(self.assigned_professional_id),
            timeline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_job_row_defaults_and_ordering() {
        let row: JobRow = serde_json::from_value(json!({
            "id": "job-1",
            "title": "Roof leak",
            "category": null,
            "description": "Rain gets in",
            "location": "Taoyuan",
            "preferred_schedule": "weekdays",
            "budget_range": "",
            "urgency": "urgent",
            "status": "somethingNew",
            "assigned_professional_id": null,
            "timeline_entries": [
                {"id": "t2", "job_id": "job-1", "kind": "photo", "summary_zh": null,
                 "summary_en": "Photos", "summary_de": null, "date": "2024-05-02T00:00:00Z"},
                {"id": "t1", "job_id": "job-1", "kind": "created", "summary_zh": "建立",
                 "summary_en": "Created", "summary_de": "Erstellt", "date": "2024-05-01T00:00:00Z"},
                {"id": "t3", "job_id": "job-1", "kind": "update", "summary_zh": null,
                 "summary_en": null, "summary_de": null, "date": "yesterday"}
            ]
        }))
        .unwrap();

        let job = row.into_job().unwrap();
        assert_eq!(job.category, "");
        assert_eq!(job.budget_range, None);
        assert_eq!(job.urgency, Urgency::Urgent);
        assert_eq!(job.status, JobStatus::Matching);
        let ids: Vec<&str> = job.timeline.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(job.timeline[1].kind, TimelineKind::Photo);
        assert_eq!(job.timeline[1].summary.zh, "");
    }

    #[test]
    fn test_job_row_requires_id_and_title() {
        let row: JobRow = serde_json::from_value(json!({
            "id": "job-1", "title": "  ", "category": null, "description": null,
            "location": null, "preferred_schedule": null, "budget_range": null,
            "urgency": null, "status": null, "assigned_professional_id": null
        }))
        .unwrap();
        assert!(row.into_job().is_none());
    }

    #[test]
    fn test_job_round_trips_through_rows() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let entry = TimelineEntry::new(
            TimelineKind::Message,
            LocalizedText::new("訊息", "Message", "Nachricht"),
            date,
        );
        let job = Job {
            id: "job-9".to_string(),
            title: "Pump service".to_string(),
            category: "fire".to_string(),
            description: "Vibrating pump".to_string(),
            location: "Banqiao".to_string(),
            preferred_schedule: "Mon-Wed".to_string(),
            budget_range: Some("25,000 - 30,000".to_string()),
            urgency: Urgency::Normal,
            status: JobStatus::InProgress,
            assigned_professional_id: Some("pro-1".to_string()),
            timeline: vec![entry.clone()],
        };

        let mut row = JobRow::from(&job);
        row.timeline_entries = vec![TimelineRow::from_entry(&job.id, &entry)];

        assert_eq!(row.into_job(), Some(job));
    }

    #[test]
    fn test_todo_row_value_feeds_guard() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let task = Task::new("Buy tape".to_string(), now);
        let row = TodoRow::from(&task);
        assert!(crate::domain::task::is_valid_task(&row.to_task_value(), now));

        let partial = TodoRow {
            completed: None,
            ..row
        };
        assert!(!crate::domain::task::is_valid_task(&partial.to_task_value(), now));
    }
}
