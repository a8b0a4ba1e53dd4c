//! Repository Layer
//!
//! Data access behind async traits: a key-value blob store (SQLite or
//! in-memory) holding whole lists as JSON, an optional PostgREST-style
//! remote store, and the debounced writer that sits in front of either.

pub mod blob_repo;
#[cfg(feature = "local")]
pub mod db;
pub mod debounce;
pub mod kv_store;
#[cfg(feature = "remote")]
pub mod remote;
pub mod traits;


pub use blob_repo::{BlobRepository, StoredList, DEFAULT_MAX_BYTES, JOBS_STORAGE_KEY, TODOS_STORAGE_KEY};
pub use debounce::{DebouncedSaver, SaveStatus, DEFAULT_SAVE_DEBOUNCE_MS};
#[cfg(feature = "local")]
pub use kv_store::SqliteStore;
pub use kv_store::MemoryStore;
#[cfg(feature = "remote")]
pub use remote::{RemoteClient, RemoteJobRepository, RemoteTodoRepository};
pub use traits::{KeyValueStore, ListRepository, RepoError, RepoResult};
