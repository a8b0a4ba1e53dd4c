//! Remote Store
//!
//! Repositories backed by a PostgREST-style HTTP API (e.g. Supabase):
//! `todos`, `jobs` and `timeline_entries` tables addressed under
//! `<base>/rest/v1/<table>`.

mod rows;

pub use rows::{JobRow, TimelineRow, TodoRow};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::{ListRepository, RepoError, RepoResult};
use crate::domain::task::{parse_task_list, validate_list_size};
use crate::domain::{Clock, Job, Task};

pub const TODOS_TABLE: &str = "todos";
pub const JOBS_TABLE: &str = "jobs";
pub const TIMELINE_TABLE: &str = "timeline_entries";

/// Filter value matching every row that has an id
const ALL_ROWS: &str = "not.is.null";

/// Thin client for table reads and writes
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    pub async fn select<R: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        order: Option<&str>,
    ) -> RepoResult<Vec<R>> {
        let mut req = self.request(Method::GET, table).query(&[("select", columns)]);
        if let Some(order) = order {
            req = req.query(&[("order", order)]);
        }
        let resp = check_status(req.send().await?).await?;
        Ok(resp.json::<Vec<R>>().await?)
    }

    /// Insert or update rows by primary key
    pub async fn upsert<R: Serialize + Sync>(&self, table: &str, rows: &[R]) -> RepoResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let req = self
            .request(Method::POST, table)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        check_status(req.send().await?).await?;
        Ok(())
    }

    /// Delete rows where `column` matches a PostgREST filter such as `eq.5`
    pub async fn delete_where(&self, table: &str, column: &str, filter: &str) -> RepoResult<()> {
        let req = self.request(Method::DELETE, table).query(&[(column, filter)]);
        check_status(req.send().await?).await?;
        Ok(())
    }

    /// Connectivity check: read at most one job row
    pub async fn ping(&self) -> RepoResult<()> {
        let req = self
            .request(Method::GET, JOBS_TABLE)
            .query(&[("select", "id"), ("limit", "1")]);
        check_status(req.send().await?).await?;
        Ok(())
    }
}

async fn check_status(resp: Response) -> RepoResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RepoError::Remote(format!("{}: {}", status, body)))
}

/// PostgREST filter excluding the given ids, e.g. `not.in.("a","b")`
pub fn not_in_filter<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = ids
        .into_iter()
        .map(|id| format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("not.in.({})", quoted.join(","))
}

/// Todo list stored as rows of the `todos` table
pub struct RemoteTodoRepository {
    client: RemoteClient,
    clock: Arc<dyn Clock>,
}

impl RemoteTodoRepository {
    pub fn new(client: RemoteClient, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }
}

#[async_trait]
impl ListRepository<Task> for RemoteTodoRepository {
    async fn load(&self) -> RepoResult<Vec<Task>> {
        let rows: Vec<TodoRow> = self
            .client
            .select(TODOS_TABLE, "*", Some("created_at.desc"))
            .await?;
        let value = Value::Array(rows.iter().map(TodoRow::to_task_value).collect());

        match parse_task_list(value, self.clock.now()) {
            Some(tasks) => Ok(tasks),
            None => {
                warn!("Remote todo rows failed structural validation, ignoring them");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, items: &[Task]) -> RepoResult<()> {
        if items.is_empty() {
            return self.clear().await;
        }
        validate_list_size(items.len()).map_err(|e| RepoError::Invalid(e.to_string()))?;

        let rows: Vec<TodoRow> = items.iter().map(TodoRow::from).collect();
        self.client.upsert(TODOS_TABLE, &rows).await?;
        self.client
            .delete_where(TODOS_TABLE, "id", &not_in_filter(items.iter().map(|t| t.id.as_str())))
            .await?;
        debug!(count = items.len(), "Saved todos to remote store");
        Ok(())
    }

    async fn clear(&self) -> RepoResult<()> {
        self.client.delete_where(TODOS_TABLE, "id", ALL_ROWS).await
    }
}

/// Jobs in the `jobs` table with their `timeline_entries`
pub struct RemoteJobRepository {
    client: RemoteClient,
}

impl RemoteJobRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ListRepository<Job> for RemoteJobRepository {
    async fn load(&self) -> RepoResult<Vec<Job>> {
        let rows: Vec<JobRow> = self
            .client
            .select(JOBS_TABLE, "*,timeline_entries(*)", Some("position.asc"))
            .await?;
        Ok(rows.into_iter().filter_map(JobRow::into_job).collect())
    }

    async fn save(&self, items: &[Job]) -> RepoResult<()> {
        if items.is_empty() {
            return self.clear().await;
        }

        let job_rows: Vec<JobRow> = items
            .iter()
            .enumerate()
            .map(|(index, job)| JobRow {
                position: Some(index as i64),
                ..JobRow::from(job)
            })
            .collect();
        let timeline_rows: Vec<TimelineRow> = items
            .iter()
            .flat_map(|job| {
                job.timeline
                    .iter()
                    .map(move |entry| TimelineRow::from_entry(&job.id, entry))
            })
            .collect();

        self.client.upsert(JOBS_TABLE, &job_rows).await?;
        self.client.upsert(TIMELINE_TABLE, &timeline_rows).await?;

        let entry_ids = items
            .iter()
            .flat_map(|job| job.timeline.iter().map(|entry| entry.id.as_str()));
        self.client
            .delete_where(TIMELINE_TABLE, "id", &not_in_filter(entry_ids))
            .await?;
        self.client
            .delete_where(JOBS_TABLE, "id", &not_in_filter(items.iter().map(|j| j.id.as_str())))
            .await?;
        debug!(count = items.len(), "Saved jobs to remote store");
        Ok(())
    }

    async fn clear(&self) -> RepoResult<()> {
        self.client.delete_where(TIMELINE_TABLE, "id", ALL_ROWS).await?;
        self.client.delete_where(JOBS_TABLE, "id", ALL_ROWS).await
    }
}
