//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations can use SQLite, in-memory maps or a remote REST backend.

use async_trait::async_trait;

/// Common result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Storage quota exceeded: about {estimated} bytes, limit is {limit} bytes")]
    QuotaExceeded { estimated: usize, limit: usize },
    #[error("Refusing to save: {0}")]
    Invalid(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Remote backend error: {0}")]
    Remote(String),
}

#[cfg(feature = "local")]
impl From<rusqlite::Error> for RepoError {
    fn from(e: rusqlite::Error) -> Self {
        RepoError::Storage(e.to_string())
    }
}

#[cfg(feature = "remote")]
impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        RepoError::Remote(e.to_string())
    }
}

/// String blobs addressed by key
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> RepoResult<()>;

    async fn remove(&self, key: &str) -> RepoResult<()>;
}

/// A whole list persisted and restored as one unit
///
/// `load` never fails on bad stored data: anything that does not pass
/// validation comes back as an empty list.
#[async_trait]
pub trait ListRepository<T>: Send + Sync {
    async fn load(&self) -> RepoResult<Vec<T>>;

    async fn save(&self, items: &[T]) -> RepoResult<()>;

    /// Remove the persisted entry altogether
    async fn clear(&self) -> RepoResult<()>;
}
