//! Todo Commands
//!
//! Operations behind the todo page. The list lives in memory and is the
//! single source of truth while the page is open; every mutation schedules
//! a debounced save of the whole list.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use super::rate_limit::{RateLimitError, RateLimiter};
use crate::config::Limits;
use crate::domain::task::{is_duplicate, sanitize_text, validate_list_size, MAX_TASKS};
use crate::domain::validation::validate_todo_text;
use crate::domain::{require_position, Clock, DomainError, Field, FieldError, Task, TaskCounts, TaskError, TaskFilter};
use crate::events::{AppEvent, EventBus};
use crate::repository::{DebouncedSaver, ListRepository, RepoError, SaveStatus, TODOS_STORAGE_KEY};

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error(transparent)]
    Invalid(#[from] FieldError),
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    #[error(transparent)]
    Integrity(#[from] TaskError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub struct TodoCommands {
    tasks: Vec<Task>,
    repo: Arc<dyn ListRepository<Task>>,
    saver: DebouncedSaver<Task>,
    save_status: watch::Receiver<SaveStatus>,
    limiter: RateLimiter,
    duplicate_window: Duration,
    clock: Arc<dyn Clock>,
    bus: EventBus<AppEvent>,
    error: Option<String>,
}

impl TodoCommands {
    /// Set up an empty list; call `load` to restore saved tasks
    pub fn new(
        repo: Arc<dyn ListRepository<Task>>,
        clock: Arc<dyn Clock>,
        bus: EventBus<AppEvent>,
        limits: &Limits,
    ) -> Self {
        let saver = DebouncedSaver::spawn(
            repo.clone(),
            StdDuration::from_millis(limits.save_debounce_ms),
            bus.clone(),
            TODOS_STORAGE_KEY,
        );
        let save_status = saver.watch_status();

        Self {
            tasks: Vec::new(),
            repo,
            saver,
            save_status,
            limiter: RateLimiter::new(limits),
            duplicate_window: Duration::milliseconds(limits.duplicate_window_ms),
            clock,
            bus,
            error: None,
        }
    }

    // ========================
    // Loading
    // ========================

    /// Replace the in-memory list with what storage holds
    pub async fn load(&mut self) -> Result<&[Task], TodoError> {
        let loaded = self.repo.load().await;
        match loaded {
            Ok(tasks) => self.tasks = tasks,
            Err(e) => {
                warn!("Failed to load todos: {}", e);
                self.tasks.clear();
                return Err(e.into());
            }
        }
        info!(count = self.tasks.len(), "Loaded todos");
        self.notify();
        Ok(&self.tasks)
    }

    // ========================
    // Mutations
    // ========================

    /// Add a task at the front of the list.
    ///
    /// Gates run in a fixed order and the first failure wins; a rejected
    /// add leaves the list and the rate limiter untouched.
    pub async fn add(&mut self, text: &str) -> Result<&Task, TodoError> {
        match self.admit(text) {
            Ok(task) => {
                self.limiter.commit(task.created_at);
                self.tasks.insert(0, task);
                self.error = None;
                self.persist();
                Ok(&self.tasks[0])
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn admit(&mut self, text: &str) -> Result<Task, TodoError> {
        let now = self.clock.now();

        if text.trim().is_empty() {
            return Err(FieldError::Required {
                field: Field::TodoText,
            }
            .into());
        }
        let text = text.trim();
        self.limiter.check(now)?;
        validate_list_size(self.tasks.len() + 1)?;
        validate_todo_text(text)?;
        if is_duplicate(text, &self.tasks, self.duplicate_window, now) {
            return Err(TaskError::Duplicate.into());
        }

        let sanitized = sanitize_text(text);
        if sanitized.is_empty() {
            return Err(TaskError::EmptyAfterSanitize.into());
        }
        Ok(Task::new(sanitized, now))
    }

    /// Flip completion; returns the new state
    pub fn toggle(&mut self, id: &str) -> Result<bool, TodoError> {
        let index = require_position(&self.tasks, id)?;
        let task = &mut self.tasks[index];
        task.toggle();
        let completed = task.completed;
        self.persist();
        Ok(completed)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), TodoError> {
        let index = require_position(&self.tasks, id)?;
        self.tasks.remove(index);
        self.persist();
        Ok(())
    }

    /// Remove every completed task; returns how many went
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        self.saver.schedule(self.tasks.clone());
        self.notify();
    }

    fn notify(&self) {
        self.bus.publish(AppEvent::TasksChanged {
            count: self.tasks.len(),
        });
    }

    /// Write any pending save now
    pub async fn flush(&self) -> Result<(), TodoError> {
        Ok(self.saver.flush().await?)
    }

    // ========================
    // Queries
    // ========================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filtered(&self, filter: TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::of(&self.tasks)
    }

    pub fn at_capacity(&self) -> bool {
        self.tasks.len() >= MAX_TASKS
    }

    /// Message to show, if any. Save outcomes that arrived since the last
    /// call are folded in first.
    pub fn error(&mut self) -> Option<&str> {
        if self.save_status.has_changed().unwrap_or(false) {
            match &*self.save_status.borrow_and_update() {
                SaveStatus::Failed(message) => self.error = Some(message.clone()),
                SaveStatus::Saved => self.error = None,
                SaveStatus::Idle | SaveStatus::Pending => {}
            }
        }
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saver.status()
    }
}
