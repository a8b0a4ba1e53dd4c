//! Engineer Finder Core
//!
//! Layered architecture:
//! - domain: Entities, validation and integrity rules (no I/O)
//! - repository: Storage abstractions and implementations
//! - commands: Page controllers for the todo list and the job board
//! - events: Event bus and toasts shared between controllers and views
//!
//! `App` wires these together from an `AppConfig`.

pub mod commands;
pub mod config;
pub mod domain;
pub mod events;
pub mod repository;

use std::sync::Arc;

use tracing::info;

use commands::{JobCommands, TodoCommands, TodoError};
use config::{AppConfig, ConfigError, Limits, StorageBackend};
use domain::seed::sample_professionals;
use domain::{Clock, Job, Professional, SystemClock, Task};
use events::{AppEvent, EventBus, Subscription, ToastCenter};
use repository::{BlobRepository, KeyValueStore, ListRepository, MemoryStore, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logger(#[from] rolling_logger::LoggerError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("Storage backend '{0}' is not compiled into this build")]
    Unsupported(&'static str),
}

/// Handles shared by every controller
#[derive(Clone)]
pub struct AppState {
    pub bus: EventBus<AppEvent>,
    pub clock: Arc<dyn Clock>,
    pub toasts: ToastCenter,
    pub limits: Limits,
}

pub struct App {
    pub state: AppState,
    pub todos: TodoCommands,
    pub jobs: JobCommands,
    /// Static recommendation list
    pub professionals: Vec<Professional>,
}

type Repositories = (Arc<dyn ListRepository<Task>>, Arc<dyn ListRepository<Job>>);

impl App {
    /// Read the environment and start
    pub async fn from_env() -> Result<Self, AppError> {
        Self::bootstrap(AppConfig::load()?).await
    }

    pub async fn bootstrap(config: AppConfig) -> Result<Self, AppError> {
        if let Some(dir) = &config.log_dir {
            rolling_logger::init_logger(dir, "engineer-finder")?;
        }
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Build every component on `clock` and load both lists
    pub async fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let bus = EventBus::default();
        let toasts = ToastCenter::new(bus.clone(), clock.clone());
        let state = AppState {
            bus: bus.clone(),
            clock: clock.clone(),
            toasts: toasts.clone(),
            limits: config.limits,
        };

        let (todo_repo, job_repo) = repositories(&config, clock.clone())?;
        let mut todos = TodoCommands::new(todo_repo, clock.clone(), bus.clone(), &config.limits);
        let mut jobs = JobCommands::new(job_repo, clock.clone(), bus, toasts);

        if let Err(e) = todos.load().await {
            // an unreadable todo list starts empty
            tracing::warn!("Starting with an empty todo list: {}", e);
        }
        jobs.load().await;
        info!(
            todos = todos.tasks().len(),
            jobs = jobs.jobs().len(),
            "Engineer finder ready"
        );

        Ok(Self {
            professionals: sample_professionals(clock.now()),
            state,
            todos,
            jobs,
        })
    }

    pub fn subscribe(&self) -> Subscription<AppEvent> {
        self.state.bus.subscribe()
    }

    pub fn professional(&self, id: &str) -> Option<&Professional> {
        domain::position_of(&self.professionals, id).map(|i| &self.professionals[i])
    }

    /// Write anything still waiting in the debounce window
    pub async fn shutdown(self) -> Result<(), TodoError> {
        self.todos.flush().await?;
        info!("Engineer finder stopped");
        Ok(())
    }
}

fn repositories(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Repositories, AppError> {
    let store: Arc<dyn KeyValueStore> = match &config.storage {
        StorageBackend::Local { db_path } => local_store(db_path)?,
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Remote { url, api_key } => return remote_repositories(url, api_key, clock),
    };

    let max_bytes = config.limits.max_storage_bytes;
    let todos: Arc<dyn ListRepository<Task>> =
        Arc::new(BlobRepository::<Task>::new(store.clone(), clock.clone()).with_max_bytes(max_bytes));
    let jobs: Arc<dyn ListRepository<Job>> =
        Arc::new(BlobRepository::<Job>::new(store, clock).with_max_bytes(max_bytes));
    Ok((todos, jobs))
}

#[cfg(feature = "local")]
fn local_store(path: &std::path::Path) -> Result<Arc<dyn KeyValueStore>, AppError> {
    info!(path = %path.display(), "Opening local store");
    Ok(Arc::new(repository::SqliteStore::open(path)?))
}

#[cfg(not(feature = "local"))]
fn local_store(_path: &std::path::Path) -> Result<Arc<dyn KeyValueStore>, AppError> {
    Err(AppError::Unsupported("local"))
}

#[cfg(feature = "remote")]
fn remote_repositories(url: &str, api_key: &str, clock: Arc<dyn Clock>) -> Result<Repositories, AppError> {
    use repository::{RemoteClient, RemoteJobRepository, RemoteTodoRepository};

    info!(url, "Using remote store");
    let client = RemoteClient::new(url, api_key);
    let todos: Arc<dyn ListRepository<Task>> = Arc::new(RemoteTodoRepository::new(client.clone(), clock));
    let jobs: Arc<dyn ListRepository<Job>> = Arc::new(RemoteJobRepository::new(client));
    Ok((todos, jobs))
}

#[cfg(not(feature = "remote"))]
fn remote_repositories(_url: &str, _api_key: &str, _clock: Arc<dyn Clock>) -> Result<Repositories, AppError> {
    Err(AppError::Unsupported("remote"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManualClock;
    use chrono::{TimeZone, Utc};

    fn memory_config() -> AppConfig {
        AppConfig {
            storage: StorageBackend::Memory,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_in_memory() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        let mut app = App::with_clock(memory_config(), Arc::new(clock)).await.unwrap();
        let mut events = app.subscribe();

        assert!(app.todos.tasks().is_empty());
        assert_eq!(app.jobs.jobs().len(), 3);
        assert!(app.professional("pro-li-jianhong").is_some());

        app.todos.add("Measure window frame").await.unwrap();
        assert_eq!(events.recv().await, Some(AppEvent::TasksChanged { count: 1 }));

        app.shutdown().await.unwrap();
    }

    #[cfg(feature = "local")]
    #[tokio::test]
    async fn test_local_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage: StorageBackend::Local {
                db_path: dir.path().join("engineer-finder.db"),
            },
            ..AppConfig::default()
        };

        let mut app = App::with_clock(config.clone(), Arc::new(SystemClock)).await.unwrap();
        app.todos.add("Replace faucet washer").await.unwrap();
        let id = app.jobs.jobs()[0].id.clone();
        app.jobs.delete(&id).await.unwrap();
        app.shutdown().await.unwrap();

        let app = App::with_clock(config, Arc::new(SystemClock)).await.unwrap();
        assert_eq!(app.todos.tasks()[0].text, "Replace faucet washer");
        assert_eq!(app.jobs.jobs().len(), 2);
        assert!(app.jobs.get(&id).is_none());
    }
}
