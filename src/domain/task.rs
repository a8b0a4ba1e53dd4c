//! Task Entity
//!
//! The personal checklist item plus the integrity rules applied before a
//! task list is trusted from storage or extended by the user.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::Entity;

/// Upper bound on the number of tasks in a list
pub const MAX_TASKS: usize = 1000;
/// Upper bound on task text, in characters
pub const MAX_TASK_TEXT: usize = 500;
/// Upper bound on a stored task id, in characters
pub const MAX_TASK_ID: usize = 100;
/// Tolerated clock skew for timestamps in the future
pub const CLOCK_SKEW_MS: i64 = 60_000;
/// Default duplicate-suppression window
pub const DEFAULT_DUPLICATE_WINDOW_MS: i64 = 60_000;
/// 2000-01-01T00:00:00Z
const MIN_CREATED_AT_MS: i64 = 946_684_800_000;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<script[^>]*>.*?</script>").expect("script pattern is valid")
});
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on[a-z0-9_]+\s*=").expect("handler pattern is valid"));
static SCRIPT_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("uri pattern is valid"));
static HTML_DATA_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)data:text/html").expect("data uri pattern is valid"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A single checklist item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque unique identifier
    pub id: String,
    /// Sanitized text
    pub text: String,
    /// Completion status
    pub completed: bool,
    /// Creation time, serialized as ISO-8601
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create an open task with a fresh id
    pub fn new(text: String, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text,
            completed: false,
            created_at: now,
        }
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

impl Entity for Task {
    const KIND: &'static str = "Todo";
    type Id = str;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Errors raised by the task-list integrity rules
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Maximum of {max} todos allowed. Please delete some todos.")]
    TooMany { max: usize },
    #[error("This todo was recently added")]
    Duplicate,
    #[error("Todo text is invalid after sanitization")]
    EmptyAfterSanitize,
}

/// Which tasks a list view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }
}

/// Stored creation time: RFC 3339, or a bare `YYYY-MM-DD` read as
/// midnight UTC
pub fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Creation timestamps must parse, be no later than `now` plus the skew
/// allowance and no earlier than the year 2000.
pub fn is_valid_date(value: &str, now: DateTime<Utc>) -> bool {
    match parse_created_at(value) {
        Some(date) => {
            date <= now + Duration::milliseconds(CLOCK_SKEW_MS)
                && date.timestamp_millis() >= MIN_CREATED_AT_MS
        }
        None => false,
    }
}

/// Structural guard for a deserialized task
pub fn is_valid_task(value: &Value, now: DateTime<Utc>) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let (Some(id), Some(text), Some(_completed), Some(created_at)) = (
        obj.get("id").and_then(Value::as_str),
        obj.get("text").and_then(Value::as_str),
        obj.get("completed").and_then(Value::as_bool),
        obj.get("createdAt").and_then(Value::as_str),
    ) else {
        return false;
    };

    let id_len = id.chars().count();
    let text_len = text.chars().count();

    id_len > 0
        && id_len <= MAX_TASK_ID
        && text_len > 0
        && text_len <= MAX_TASK_TEXT
        && is_valid_date(created_at, now)
}

pub fn is_valid_task_list(value: &Value, now: DateTime<Utc>) -> bool {
    match value.as_array() {
        Some(items) => items.iter().all(|item| is_valid_task(item, now)),
        None => false,
    }
}

/// Decode a list only when every element passes the guard
pub fn parse_task_list(mut value: Value, now: DateTime<Utc>) -> Option<Vec<Task>> {
    if !is_valid_task_list(&value, now) {
        return None;
    }
    // bring every timestamp to the RFC 3339 form serde expects
    for item in value.as_array_mut()? {
        let created_at = item.get("createdAt").and_then(Value::as_str).and_then(parse_created_at)?;
        item["createdAt"] = Value::String(created_at.to_rfc3339());
    }
    serde_json::from_value(value).ok()
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}'..='\u{c}' | '\u{e}'..='\u{1f}' | '\u{7f}')
}

fn strip_dangerous(text: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(text, "");
    let text = EVENT_HANDLER.replace_all(&text, "");
    let text = SCRIPT_URI.replace_all(&text, "");
    HTML_DATA_URI.replace_all(&text, "").into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Clean user text before it is stored.
///
/// Removing one pattern can splice a new one together, so stripping and
/// whitespace collapsing repeat until nothing changes. The result is
/// therefore a fixed point: sanitizing it again returns it unchanged.
pub fn sanitize_text(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| !is_stripped_control(*c)).collect();
    let mut current: String = cleaned.trim().chars().take(MAX_TASK_TEXT).collect();

    loop {
        let next = collapse_whitespace(&strip_dangerous(&current));
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Trimmed, case-folded form used only for comparisons
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// True when an existing task has the same normalized text and was created
/// within `window` before `now`. Tasks dated after `now` never match.
pub fn is_duplicate(text: &str, existing: &[Task], window: Duration, now: DateTime<Utc>) -> bool {
    let normalized = normalize(text);
    existing.iter().any(|task| {
        let elapsed = now - task.created_at;
        normalize(&task.text) == normalized && elapsed >= Duration::zero() && elapsed <= window
    })
}

pub fn validate_list_size(len: usize) -> Result<(), TaskError> {
    if len > MAX_TASKS {
        return Err(TaskError::TooMany { max: MAX_TASKS });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn task_at(text: &str, created_at: DateTime<Utc>) -> Task {
        Task {
            id: format!("id-{}", text),
            text: text.to_string(),
            completed: false,
            created_at,
        }
    }

    #[test]
    fn test_task_creation() {
        let task = Task::new("Call plumber".to_string(), now());
        assert_eq!(task.id().len(), 36);
        assert!(!task.completed);
        assert_eq!(task.created_at, now());
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = task_at("Call plumber", now());
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["createdAt"], json!("2024-06-01T12:00:00Z"));
        assert!(is_valid_task(&value, now()));
    }

    #[test]
    fn test_valid_task_guard() {
        let good = json!({
            "id": "a1", "text": "Fix sink", "completed": false,
            "createdAt": "2024-05-30T10:00:00.000Z"
        });
        assert!(is_valid_task(&good, now()));

        let mut missing = good.clone();
        missing.as_object_mut().unwrap().remove("completed");
        assert!(!is_valid_task(&missing, now()));

        let mut wrong_type = good.clone();
        wrong_type["completed"] = json!("yes");
        assert!(!is_valid_task(&wrong_type, now()));

        let mut empty_text = good.clone();
        empty_text["text"] = json!("");
        assert!(!is_valid_task(&empty_text, now()));

        let mut long_id = good.clone();
        long_id["id"] = json!("x".repeat(101));
        assert!(!is_valid_task(&long_id, now()));

        let mut long_text = good;
        long_text["text"] = json!("y".repeat(501));
        assert!(!is_valid_task(&long_text, now()));

        assert!(!is_valid_task(&json!("task"), now()));
        assert!(!is_valid_task(&Value::Null, now()));
    }

    #[test]
    fn test_date_rule() {
        assert!(is_valid_date("2024-06-01T12:00:59Z", now()));
        assert!(!is_valid_date("2024-06-01T12:01:01Z", now()));
        assert!(is_valid_date("2000-01-01T00:00:00Z", now()));
        assert!(!is_valid_date("1999-12-31T23:59:59Z", now()));
        assert!(!is_valid_date("not a date", now()));
        assert!(!is_valid_date("", now()));

        // a bare date is midnight UTC
        assert!(is_valid_date("2024-05-30", now()));
        assert!(!is_valid_date("1999-12-31", now()));
        assert!(!is_valid_date("2024-13-01", now()));
    }

    #[test]
    fn test_task_list_guard() {
        assert!(is_valid_task_list(&json!([]), now()));
        assert!(!is_valid_task_list(&json!({}), now()));
        let list = json!([
            {"id": "1", "text": "a", "completed": true, "createdAt": "2024-01-01T00:00:00Z"},
            {"id": "2", "text": "b", "createdAt": "2024-01-01T00:00:00Z"}
        ]);
        assert!(!is_valid_task_list(&list, now()));
    }

    #[test]
    fn test_parse_task_list() {
        let list = json!([
            {"id": "1", "text": "a", "completed": true, "createdAt": "2024-01-01T00:00:00Z"}
        ]);
        let tasks = parse_task_list(list, now()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].completed);

        assert!(parse_task_list(json!({"id": "1"}), now()).is_none());
    }

    #[test]
    fn test_parse_task_list_with_bare_date() {
        let list = json!([
            {"id": "1", "text": "a", "completed": false, "createdAt": "2024-05-30"}
        ]);
        let tasks = parse_task_list(list, now()).unwrap();
        assert_eq!(tasks[0].created_at, Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_sanitize_scenario() {
        assert_eq!(
            sanitize_text("  Fix <script>alert(1)</script> leaky sink  "),
            "Fix leaky sink"
        );
    }

    #[test]
    fn test_sanitize_strips_patterns() {
        assert_eq!(sanitize_text("a\u{0}b\u{7f}c"), "abc");
        assert_eq!(sanitize_text("link javascript:go"), "link go");
        assert_eq!(sanitize_text("x onClick = y"), "x y");
        assert_eq!(sanitize_text("see data:text/html,hi"), "see ,hi");
        assert_eq!(sanitize_text("line one\n\n\tline two"), "line one line two");
    }

    #[test]
    fn test_sanitize_handles_spliced_patterns() {
        assert_eq!(sanitize_text("oonclick=nclick=go"), "go");
        assert_eq!(sanitize_text("a <script>\n</script> b"), "a b");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "word ".repeat(200);
        let out = sanitize_text(&long);
        assert!(out.chars().count() <= MAX_TASK_TEXT);
    }

    #[test]
    fn test_duplicate_window() {
        let existing = vec![task_at("Fix Sink", now() - Duration::milliseconds(30_000))];
        let window = Duration::milliseconds(DEFAULT_DUPLICATE_WINDOW_MS);

        assert!(is_duplicate("  fix sink ", &existing, window, now()));
        assert!(!is_duplicate("fix sinks", &existing, window, now()));

        let later = now() + Duration::milliseconds(30_001);
        assert!(!is_duplicate("fix sink", &existing, window, later));
    }

    #[test]
    fn test_duplicate_ignores_future_tasks() {
        let existing = vec![task_at("fix sink", now() + Duration::milliseconds(5_000))];
        let window = Duration::milliseconds(DEFAULT_DUPLICATE_WINDOW_MS);
        assert!(!is_duplicate("fix sink", &existing, window, now()));
    }

    #[test]
    fn test_list_size() {
        assert_eq!(validate_list_size(1000), Ok(()));
        let err = validate_list_size(1001).unwrap_err();
        assert_eq!(err, TaskError::TooMany { max: 1000 });
        assert!(err.to_string().contains("1000"));
    }

    #[test]
    fn test_filter_and_counts() {
        let mut done = task_at("done", now());
        done.toggle();
        let open = task_at("open", now());
        let tasks = vec![done.clone(), open.clone()];

        assert!(TaskFilter::Completed.matches(&done));
        assert!(!TaskFilter::Active.matches(&done));
        assert!(TaskFilter::All.matches(&open));
        assert_eq!(
            TaskCounts::of(&tasks),
            TaskCounts { total: 2, active: 1, completed: 1 }
        );
    }

    fn fragment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("<script>".to_string()),
            Just("</script>".to_string()),
            Just("<SCRIPT src=x>".to_string()),
            Just("on".to_string()),
            Just("click=".to_string()),
            Just("java".to_string()),
            Just("script:".to_string()),
            Just("data:text/html".to_string()),
            Just("\n".to_string()),
            Just("\t \u{1}".to_string()),
            "[a-zA-Z =<>/]{0,6}",
        ]
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(s in any::<String>()) {
            let once = sanitize_text(&s);
            prop_assert_eq!(sanitize_text(&once), once);
        }

        #[test]
        fn prop_sanitize_is_idempotent_on_markup(parts in prop::collection::vec(fragment(), 0..40)) {
            let s = parts.concat();
            let once = sanitize_text(&s);
            prop_assert_eq!(sanitize_text(&once), once);
        }

        #[test]
        fn prop_sanitize_bounds_length(s in "[a-z <>\n]{501,800}") {
            prop_assert!(sanitize_text(&s).chars().count() <= MAX_TASK_TEXT);
        }

        #[test]
        fn prop_oversized_lists_rejected(len in (MAX_TASKS + 1)..5000usize) {
            prop_assert!(validate_list_size(len).is_err());
        }
    }
}
