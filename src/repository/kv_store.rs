//! Key-Value Stores
//!
//! `SqliteStore` keeps blobs in the local device database; `MemoryStore`
//! keeps them for the lifetime of the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::{KeyValueStore, RepoResult};

#[cfg(feature = "local")]
pub use sqlite::SqliteStore;

#[cfg(feature = "local")]
mod sqlite {
    use super::*;
    use rusqlite::{Connection, OptionalExtension};
    use std::path::Path;

    use crate::repository::db::init_db;

    /// SQLite implementation of the blob store
    pub struct SqliteStore {
        conn: Arc<Mutex<Connection>>,
    }

    impl SqliteStore {
        pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
            Self { conn }
        }

        /// Open and migrate the database at `path`
        pub fn open(path: &Path) -> RepoResult<Self> {
            let conn = init_db(path)?;
            Ok(Self::new(Arc::new(Mutex::new(conn))))
        }
    }

    #[async_trait]
    impl KeyValueStore for SqliteStore {
        async fn get(&self, key: &str) -> RepoResult<Option<String>> {
            let conn = self.conn.lock().await;
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    [key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        }

        async fn set(&self, key: &str, value: &str) -> RepoResult<()> {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                [key, value],
            )?;
            Ok(())
        }

        async fn remove(&self, key: &str) -> RepoResult<()> {
            let conn = self.conn.lock().await;
            conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
            Ok(())
        }
    }
}

/// In-process blob store
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> RepoResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
