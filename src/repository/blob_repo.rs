//! Blob Repository
//!
//! Persists a whole list as one JSON array under a single storage key.
//! Stored data is only trusted after it passes the record guard; anything
//! else is dropped and the entry removed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::{KeyValueStore, ListRepository, RepoError, RepoResult};
use crate::domain::task::{parse_task_list, validate_list_size};
use crate::domain::{Clock, Job, Task};

/// Storage key of the todo list
pub const TODOS_STORAGE_KEY: &str = "engineer-finder-todos";
/// Storage key of the job list
pub const JOBS_STORAGE_KEY: &str = "engineer-finder-jobs";
/// Write ceiling, 5 MiB
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Records that can be stored as a JSON list blob
pub trait StoredList: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const STORAGE_KEY: &'static str;

    /// Decode a persisted value; `None` means discard it
    fn decode_list(value: Value, now: DateTime<Utc>) -> Option<Vec<Self>>;

    /// Last check before a list is written
    fn check_before_save(_items: &[Self]) -> RepoResult<()> {
        Ok(())
    }
}

impl StoredList for Task {
    const STORAGE_KEY: &'static str = TODOS_STORAGE_KEY;

    fn decode_list(value: Value, now: DateTime<Utc>) -> Option<Vec<Self>> {
        parse_task_list(value, now)
    }

    fn check_before_save(items: &[Self]) -> RepoResult<()> {
        validate_list_size(items.len()).map_err(|e| RepoError::Invalid(e.to_string()))
    }
}

impl StoredList for Job {
    const STORAGE_KEY: &'static str = JOBS_STORAGE_KEY;

    fn decode_list(value: Value, _now: DateTime<Utc>) -> Option<Vec<Self>> {
        if !value.is_array() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

/// Size a browser-style store would charge: two bytes per UTF-16 unit
pub fn estimated_size(json: &str) -> usize {
    json.encode_utf16().count() * 2
}

pub struct BlobRepository<T> {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
    max_bytes: usize,
    _records: PhantomData<fn() -> T>,
}

impl<T: StoredList> BlobRepository<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            key: T::STORAGE_KEY.to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            _records: PhantomData,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    async fn discard(&self, reason: &str) -> RepoResult<Vec<T>> {
        warn!(key = %self.key, "Discarding stored list: {}", reason);
        if let Err(e) = self.store.remove(&self.key).await {
            // still unreadable next time, and discarded again
            warn!(key = %self.key, "Failed to remove discarded list: {}", e);
        }
        Ok(Vec::new())
    }
}

#[async_trait]
impl<T: StoredList> ListRepository<T> for BlobRepository<T> {
    async fn load(&self) -> RepoResult<Vec<T>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => return self.discard(&format!("invalid JSON ({})", e)).await,
        };

        match T::decode_list(value, self.clock.now()) {
            Some(items) => {
                debug!(key = %self.key, count = items.len(), "Loaded stored list");
                Ok(items)
            }
            None => self.discard("failed structural validation").await,
        }
    }

    async fn save(&self, items: &[T]) -> RepoResult<()> {
        if items.is_empty() {
            return self.clear().await;
        }
        T::check_before_save(items)?;

        let json = serde_json::to_string(items)?;
        let estimated = estimated_size(&json);
        if estimated > self.max_bytes {
            return Err(RepoError::QuotaExceeded {
                estimated,
                limit: self.max_bytes,
            });
        }

        self.store.set(&self.key, &json).await
    }

    async fn clear(&self) -> RepoResult<()> {
        self.store.remove(&self.key).await
    }
}
