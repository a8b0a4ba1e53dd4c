//! Job Board Commands
//!
//! Operations behind the job board. Every mutation is written through to
//! the repository before it becomes visible; when the write fails the
//! previous list stays in place.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::seed::sample_jobs;
use crate::domain::{
    position_of, require_position, Clock, DomainError, FormErrors, Job, JobForm, JobStatus, JobUpdate, Locale,
    Professional,
};
use crate::events::{AppEvent, EventBus, ToastCenter, ToastKind};
use crate::repository::{ListRepository, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Invalid job request: {0}")]
    Invalid(#[from] FormErrors),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Who is looking at the board
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    Customer,
    /// Sees only the jobs assigned to them
    Professional { professional_id: String },
}

impl Viewer {
    pub fn can_create_jobs(&self) -> bool {
        matches!(self, Viewer::Customer)
    }

    pub fn can_see(&self, job: &Job) -> bool {
        match self {
            Viewer::Professional { professional_id } => {
                job.assigned_professional_id.as_deref() == Some(professional_id.as_str())
            }
            Viewer::Anonymous | Viewer::Customer => true,
        }
    }
}

/// Outcome messages shown as toasts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobNotice {
    Created,
    CreateFailed,
    Assigned { professional_name: String },
    AssignFailed,
}

impl JobNotice {
    pub fn kind(&self) -> ToastKind {
        match self {
            JobNotice::Created | JobNotice::Assigned { .. } => ToastKind::Success,
            JobNotice::CreateFailed | JobNotice::AssignFailed => ToastKind::Error,
        }
    }

    pub fn text(&self, locale: Locale) -> String {
        match (self, locale) {
            (JobNotice::Created, Locale::Zh) => "需求已建立".to_string(),
            (JobNotice::Created, Locale::En) => "Request created".to_string(),
            (JobNotice::Created, Locale::De) => "Anfrage erstellt".to_string(),
            (JobNotice::CreateFailed, Locale::Zh) => "建立需求失敗，請稍後再試".to_string(),
            (JobNotice::CreateFailed, Locale::En) => {
                "Could not create the request, please try again later".to_string()
            }
            (JobNotice::CreateFailed, Locale::De) => {
                "Anfrage konnte nicht erstellt werden, bitte später erneut versuchen".to_string()
            }
            (JobNotice::Assigned { professional_name }, Locale::Zh) => {
                format!("{} 已指派到此需求", professional_name)
            }
            (JobNotice::Assigned { professional_name }, Locale::En) => {
                format!("{} has been assigned to this request", professional_name)
            }
            (JobNotice::Assigned { professional_name }, Locale::De) => {
                format!("{} wurde dieser Anfrage zugewiesen", professional_name)
            }
            (JobNotice::AssignFailed, Locale::Zh) => "指派失敗，請稍後再試".to_string(),
            (JobNotice::AssignFailed, Locale::En) => {
                "Assignment failed, please try again later".to_string()
            }
            (JobNotice::AssignFailed, Locale::De) => {
                "Zuweisung fehlgeschlagen, bitte später erneut versuchen".to_string()
            }
        }
    }
}

pub struct JobCommands {
    jobs: Vec<Job>,
    repo: Arc<dyn ListRepository<Job>>,
    clock: Arc<dyn Clock>,
    bus: EventBus<AppEvent>,
    toasts: ToastCenter,
    locale: Locale,
}

impl JobCommands {
    pub fn new(
        repo: Arc<dyn ListRepository<Job>>,
        clock: Arc<dyn Clock>,
        bus: EventBus<AppEvent>,
        toasts: ToastCenter,
    ) -> Self {
        Self {
            jobs: Vec::new(),
            repo,
            clock,
            bus,
            toasts,
            locale: Locale::default(),
        }
    }

    /// Language of the toast messages
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    fn notify_user(&self, notice: JobNotice) {
        self.toasts.show(notice.text(self.locale), notice.kind());
    }

    /// Restore saved jobs, or start from the sample jobs when there are none
    pub async fn load(&mut self) -> &[Job] {
        match self.repo.load().await {
            Ok(jobs) if !jobs.is_empty() => {
                info!(count = jobs.len(), "Loaded jobs");
                self.jobs = jobs;
            }
            Ok(_) => {
                info!("No saved jobs, starting from sample data");
                let seed = sample_jobs(self.clock.now());
                if let Err(e) = self.repo.save(&seed).await {
                    warn!("Failed to save sample jobs: {}", e);
                }
                self.jobs = seed;
            }
            Err(e) => {
                error!("Failed to load jobs, using sample data: {}", e);
                self.jobs = sample_jobs(self.clock.now());
            }
        }
        self.notify();
        &self.jobs
    }

    async fn commit(&mut self, next: Vec<Job>) -> Result<(), JobError> {
        self.repo.save(&next).await?;
        self.jobs = next;
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        self.bus.publish(AppEvent::JobsChanged {
            count: self.jobs.len(),
        });
    }

    fn index_of(&self, id: &str) -> Result<usize, JobError> {
        Ok(require_position(&self.jobs, id)?)
    }

    // ========================
    // Mutations
    // ========================

    /// Validate the form and put the new job at the top of the board
    pub async fn create(&mut self, form: JobForm) -> Result<&Job, JobError> {
        let job = form.into_job(self.clock.now())?;
        let id = job.id.clone();

        let mut next = Vec::with_capacity(self.jobs.len() + 1);
        next.push(job);
        next.extend(self.jobs.iter().cloned());

        if let Err(e) = self.commit(next).await {
            error!("Failed to create job: {}", e);
            self.notify_user(JobNotice::CreateFailed);
            return Err(e);
        }
        info!(job_id = %id, "Created job");
        self.notify_user(JobNotice::Created);
        Ok(&self.jobs[0])
    }

    pub async fn update(&mut self, id: &str, update: JobUpdate) -> Result<&Job, JobError> {
        let index = self.index_of(id)?;
        let mut next = self.jobs.clone();
        update.apply(&mut next[index]);

        self.commit(next).await?;
        Ok(&self.jobs[index])
    }

    /// Hand a job to a professional and tell the user about it
    pub async fn assign(&mut self, id: &str, professional: &Professional) -> Result<&Job, JobError> {
        let index = self.index_of(id)?;
        let mut next = self.jobs.clone();
        next[index].assign(professional, self.clock.now());

        if let Err(e) = self.commit(next).await {
            error!(job_id = %id, "Failed to assign professional: {}", e);
            self.notify_user(JobNotice::AssignFailed);
            return Err(e);
        }
        info!(job_id = %id, professional_id = %professional.id, "Assigned professional");
        self.notify_user(JobNotice::Assigned {
            professional_name: professional.name.clone(),
        });
        Ok(&self.jobs[index])
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), JobError> {
        let index = self.index_of(id)?;
        let mut next = self.jobs.clone();
        next.remove(index);
        self.commit(next).await
    }

    /// Throw away every change and go back to the sample jobs
    pub async fn reset(&mut self) -> Result<&[Job], JobError> {
        self.commit(sample_jobs(self.clock.now())).await?;
        Ok(&self.jobs)
    }

    // ========================
    // Queries
    // ========================

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        position_of(&self.jobs, id).map(|i| &self.jobs[i])
    }

    pub fn visible_for(&self, viewer: &Viewer) -> Vec<&Job> {
        self.jobs.iter().filter(|job| viewer.can_see(job)).collect()
    }

    /// Jobs whose title or location contains `term`, optionally limited to
    /// one status. An empty term matches everything.
    pub fn search(&self, term: &str, status: Option<JobStatus>) -> Vec<&Job> {
        self.jobs
            .iter()
            .filter(|job| status.map_or(true, |s| job.status == s) && job.matches_term(term))
            .collect()
    }

    /// `search` restricted to what `viewer` may see
    pub fn search_for(&self, viewer: &Viewer, term: &str, status: Option<JobStatus>) -> Vec<&Job> {
        self.search(term, status)
            .into_iter()
            .filter(|job| viewer.can_see(job))
            .collect()
    }

    /// Jobs currently assigned to one professional
    pub fn assigned_to(&self, professional_id: &str) -> Vec<&Job> {
        self.jobs
            .iter()
            .filter(|job| job.assigned_professional_id.as_deref() == Some(professional_id))
            .collect()
    }
}
