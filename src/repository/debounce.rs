//! Debounced Saver
//!
//! Coalesces rapid successive list states into one write. A background
//! task owns the pending payload; every `schedule` replaces it and restarts
//! the quiet period. When the saver is dropped the task writes whatever is
//! still pending and exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error};

use super::traits::{ListRepository, RepoError, RepoResult};
use crate::events::{AppEvent, EventBus};

pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 500;

/// Outcome of the most recent write
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Pending,
    Saved,
    Failed(String),
}

enum Command<T> {
    Schedule(Vec<T>),
    Flush(oneshot::Sender<RepoResult<()>>),
    Clear(oneshot::Sender<RepoResult<()>>),
}

pub struct DebouncedSaver<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    status: watch::Receiver<SaveStatus>,
    worker: JoinHandle<()>,
}

impl<T: Send + Sync + 'static> DebouncedSaver<T> {
    /// Spawn the writer task; must be called inside a tokio runtime
    pub fn spawn(
        repo: Arc<dyn ListRepository<T>>,
        delay: Duration,
        bus: EventBus<AppEvent>,
        key: impl Into<String>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::Idle);
        let worker = Writer {
            repo,
            delay,
            bus,
            key: key.into(),
            status: status_tx,
        };
        let worker = tokio::spawn(worker.run(rx));

        Self { tx, status, worker }
    }

    /// Replace the pending payload and restart the quiet period
    pub fn schedule(&self, items: Vec<T>) {
        if self.tx.send(Command::Schedule(items)).is_err() {
            error!("Save worker is gone, dropping scheduled payload");
        }
    }

    /// Write the pending payload now, if there is one
    pub async fn flush(&self) -> RepoResult<()> {
        let (reply, result) = oneshot::channel();
        self.request(Command::Flush(reply), result).await
    }

    /// Forget the pending payload and clear the repository
    pub async fn clear(&self) -> RepoResult<()> {
        let (reply, result) = oneshot::channel();
        self.request(Command::Clear(reply), result).await
    }

    async fn request(
        &self,
        command: Command<T>,
        result: oneshot::Receiver<RepoResult<()>>,
    ) -> RepoResult<()> {
        self.tx
            .send(command)
            .map_err(|_| RepoError::Storage("save worker stopped".to_string()))?;
        result
            .await
            .map_err(|_| RepoError::Storage("save worker stopped".to_string()))?
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// Receiver that sees every status change
    pub fn watch_status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Stop the worker after it has written anything still pending
    pub async fn shutdown(self) {
        let Self { tx, worker, .. } = self;
        drop(tx);
        if let Err(e) = worker.await {
            error!("Save worker ended abnormally: {}", e);
        }
    }
}

struct Writer<T> {
    repo: Arc<dyn ListRepository<T>>,
    delay: Duration,
    bus: EventBus<AppEvent>,
    key: String,
    status: watch::Sender<SaveStatus>,
}

impl<T: Send + Sync + 'static> Writer<T> {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Command<T>>) {
        let mut pending: Option<Vec<T>> = None;
        let timer = sleep(self.delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Schedule(items)) => {
                        pending = Some(items);
                        timer.as_mut().reset(Instant::now() + self.delay);
                        self.status.send_replace(SaveStatus::Pending);
                    }
                    Some(Command::Flush(reply)) => {
                        let result = match pending.take() {
                            Some(items) => self.write(&items).await,
                            None => Ok(()),
                        };
                        let _ = reply.send(result);
                    }
                    Some(Command::Clear(reply)) => {
                        pending = None;
                        let result = self.repo.clear().await;
                        self.report(&result);
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Some(items) = pending.take() {
                            let _ = self.write(&items).await;
                        }
                        debug!(key = %self.key, "Save worker stopped");
                        return;
                    }
                },
                () = &mut timer, if pending.is_some() => {
                    if let Some(items) = pending.take() {
                        let _ = self.write(&items).await;
                    }
                }
            }
        }
    }

    async fn write(&self, items: &[T]) -> RepoResult<()> {
        let result = self.repo.save(items).await;
        self.report(&result);
        result
    }

    fn report(&self, result: &RepoResult<()>) {
        match result {
            Ok(()) => {
                debug!(key = %self.key, "Saved");
                self.status.send_replace(SaveStatus::Saved);
                self.bus.publish(AppEvent::Saved {
                    key: self.key.clone(),
                });
            }
            Err(e) => {
                error!(key = %self.key, "Failed to save: {}", e);
                self.status.send_replace(SaveStatus::Failed(e.to_string()));
                self.bus.publish(AppEvent::SaveFailed {
                    key: self.key.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        writes: Mutex<Vec<Vec<u32>>>,
        clears: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl ListRepository<u32> for Recorder {
        async fn load(&self) -> RepoResult<Vec<u32>> {
            Ok(Vec::new())
        }

        async fn save(&self, items: &[u32]) -> RepoResult<()> {
            if self.fail {
                return Err(RepoError::QuotaExceeded {
                    estimated: 10,
                    limit: 1,
                });
            }
            self.writes.lock().unwrap().push(items.to_vec());
            Ok(())
        }

        async fn clear(&self) -> RepoResult<()> {
            *self.clears.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn saver(repo: Arc<Recorder>, bus: EventBus<AppEvent>) -> DebouncedSaver<u32> {
        DebouncedSaver::spawn(repo, Duration::from_millis(500), bus, "numbers")
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_payload_is_written() {
        let repo = Arc::new(Recorder::default());
        let saver = saver(repo.clone(), EventBus::default());

        saver.schedule(vec![1]);
        sleep(Duration::from_millis(400)).await;
        saver.schedule(vec![1, 2]);
        sleep(Duration::from_millis(400)).await;
        assert!(repo.writes.lock().unwrap().is_empty());
        assert_eq!(saver.status(), SaveStatus::Pending);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(*repo.writes.lock().unwrap(), vec![vec![1, 2]]);
        assert_eq!(saver.status(), SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let repo = Arc::new(Recorder::default());
        let saver = saver(repo.clone(), EventBus::default());

        saver.schedule(vec![7]);
        saver.flush().await.unwrap();
        assert_eq!(*repo.writes.lock().unwrap(), vec![vec![7]]);

        // nothing left for the timer
        sleep(Duration::from_millis(1000)).await;
        assert_eq!(repo.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_payload() {
        let repo = Arc::new(Recorder::default());
        let saver = saver(repo.clone(), EventBus::default());

        saver.schedule(vec![3]);
        saver.clear().await.unwrap();
        sleep(Duration::from_millis(1000)).await;

        assert!(repo.writes.lock().unwrap().is_empty());
        assert_eq!(*repo.clears.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_reported() {
        let repo = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let bus = EventBus::default();
        let mut events = bus.subscribe();
        let saver = saver(repo, bus);

        saver.schedule(vec![1]);
        sleep(Duration::from_millis(600)).await;

        assert!(matches!(saver.status(), SaveStatus::Failed(_)));
        assert!(matches!(
            events.recv().await,
            Some(AppEvent::SaveFailed { key, .. }) if key == "numbers"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_writes_pending_payload() {
        let repo = Arc::new(Recorder::default());
        let saver = saver(repo.clone(), EventBus::default());

        saver.schedule(vec![9, 8]);
        saver.shutdown().await;
        assert_eq!(*repo.writes.lock().unwrap(), vec![vec![9, 8]]);
    }
}
