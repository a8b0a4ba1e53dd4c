//! Field Validation
//!
//! Stateless checks for the job-posting form, todo text and the login form.
//! Every validator returns `Ok(())` or the condition that failed; the wording
//! shown to users is left to the presentation layer.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexSet};

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 1000;
pub const LOCATION_MIN: usize = 5;
pub const LOCATION_MAX: usize = 200;
pub const SCHEDULE_MIN: usize = 5;
pub const TODO_TEXT_MAX: usize = 500;
pub const PASSWORD_MIN: usize = 3;

/// Longest repeating unit looked for by the repetition check
pub const MAX_REPEAT_UNIT: usize = 10;
/// Copies that must follow the first occurrence of a unit
pub const REPEAT_THRESHOLD: usize = 10;

static INJECTION_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)<script",
        r"(?i)javascript:",
        r"(?i)on[a-z0-9_]+\s*=",
        r"(?i)data:text/html",
        r"(?i)eval\(",
        r"(?i)expression\(",
    ])
    .expect("injection patterns are valid")
});

static BUDGET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9,\s-]+$").expect("budget pattern is valid"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Form field a validation error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Description,
    Location,
    Schedule,
    Budget,
    TodoText,
    Email,
    Password,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Location => "location",
            Field::Schedule => "schedule",
            Field::Budget => "budget",
            Field::TodoText => "todo text",
            Field::Email => "email",
            Field::Password => "password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: Field },
    #[error("{field} must be at least {min} characters")]
    TooShort { field: Field, min: usize },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: Field, max: usize },
    #[error("{field} has an invalid format")]
    InvalidFormat { field: Field },
    #[error("{field} contains invalid content")]
    ForbiddenContent { field: Field },
    #[error("{field} contains excessive repetition")]
    ExcessiveRepetition { field: Field },
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::Required { field }
            | FieldError::TooShort { field, .. }
            | FieldError::TooLong { field, .. }
            | FieldError::InvalidFormat { field }
            | FieldError::ForbiddenContent { field }
            | FieldError::ExcessiveRepetition { field } => *field,
        }
    }
}

pub type FieldResult = Result<(), FieldError>;

/// All failures of a multi-field form, keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<Field, FieldError>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one field check
    pub fn check(&mut self, result: FieldResult) {
        if let Err(err) = result {
            self.0.insert(err.field(), err);
        }
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.values()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.values().map(|e| e.to_string()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn check_length(field: Field, value: &str, min: usize, max: Option<usize>) -> FieldResult {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required { field });
    }
    let len = char_len(trimmed);
    if len < min {
        return Err(FieldError::TooShort { field, min });
    }
    match max {
        Some(max) if len > max => Err(FieldError::TooLong { field, max }),
        _ => Ok(()),
    }
}

pub fn validate_job_title(title: &str) -> FieldResult {
    check_length(Field::Title, title, TITLE_MIN, Some(TITLE_MAX))
}

pub fn validate_job_description(description: &str) -> FieldResult {
    check_length(Field::Description, description, DESCRIPTION_MIN, Some(DESCRIPTION_MAX))
}

pub fn validate_location(location: &str) -> FieldResult {
    check_length(Field::Location, location, LOCATION_MIN, Some(LOCATION_MAX))
}

pub fn validate_schedule(schedule: &str) -> FieldResult {
    check_length(Field::Schedule, schedule, SCHEDULE_MIN, None)
}

/// Budget is optional; when given it must look like "10,000 - 20,000".
pub fn validate_budget(budget: &str) -> FieldResult {
    if budget.trim().is_empty() {
        return Ok(());
    }
    if !BUDGET_PATTERN.is_match(budget) {
        return Err(FieldError::InvalidFormat { field: Field::Budget });
    }
    Ok(())
}

pub fn validate_todo_text(text: &str) -> FieldResult {
    let field = Field::TodoText;
    if text.trim().is_empty() {
        return Err(FieldError::Required { field });
    }
    let len = char_len(text);
    if len > TODO_TEXT_MAX {
        return Err(FieldError::TooLong { field, max: TODO_TEXT_MAX });
    }
    if contains_injection(text) {
        return Err(FieldError::ForbiddenContent { field });
    }
    if len > MAX_REPEAT_UNIT && has_excessive_repetition(text) {
        return Err(FieldError::ExcessiveRepetition { field });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> FieldResult {
    if email.trim().is_empty() {
        return Err(FieldError::Required { field: Field::Email });
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(FieldError::InvalidFormat { field: Field::Email });
    }
    Ok(())
}

pub fn validate_password(password: &str) -> FieldResult {
    if password.is_empty() {
        return Err(FieldError::Required { field: Field::Password });
    }
    if char_len(password) < PASSWORD_MIN {
        return Err(FieldError::TooShort {
            field: Field::Password,
            min: PASSWORD_MIN,
        });
    }
    Ok(())
}

/// Markup tags, handler assignments, script URIs and eval-like calls
pub fn contains_injection(text: &str) -> bool {
    INJECTION_PATTERNS.is_match(text)
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// True when a unit of 1..=10 chars is immediately followed by at least
/// ten more copies of itself. Units never span a line break.
pub fn has_excessive_repetition(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();

    for start in 0..chars.len() {
        for unit in 1..=MAX_REPEAT_UNIT {
            let needed = unit * (REPEAT_THRESHOLD + 1);
            if start + needed > chars.len() {
                break;
            }
            let pattern = &chars[start..start + unit];
            if pattern.iter().any(|c| is_line_terminator(*c)) {
                break;
            }
            let repeated = (1..=REPEAT_THRESHOLD).all(|k| {
                let from = start + k * unit;
                &chars[from..from + unit] == pattern
            });
            if repeated {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Fix sink")]
    #[case("  Fix  ")]
    #[case("冷氣漏水檢修")]
    fn test_title_accepts(#[case] title: &str) {
        assert_eq!(validate_job_title(title), Ok(()));
    }

    #[test]
    fn test_title_too_short() {
        assert_eq!(
            validate_job_title("AB"),
            Err(FieldError::TooShort { field: Field::Title, min: 3 })
        );
    }

    #[test]
    fn test_title_required_and_too_long() {
        assert_eq!(
            validate_job_title("   "),
            Err(FieldError::Required { field: Field::Title })
        );
        let long = "x".repeat(101);
        assert_eq!(
            validate_job_title(&long),
            Err(FieldError::TooLong { field: Field::Title, max: 100 })
        );
    }

    #[rstest]
    #[case("short", Err(FieldError::TooShort { field: Field::Description, min: 10 }))]
    #[case("Water dripping from the ceiling unit", Ok(()))]
    #[case("", Err(FieldError::Required { field: Field::Description }))]
    fn test_description(#[case] input: &str, #[case] expected: FieldResult) {
        assert_eq!(validate_job_description(input), expected);
    }

    #[rstest]
    #[case("Taipei", Ok(()))]
    #[case("TPE", Err(FieldError::TooShort { field: Field::Location, min: 5 }))]
    fn test_location(#[case] input: &str, #[case] expected: FieldResult) {
        assert_eq!(validate_location(input), expected);
    }

    #[test]
    fn test_location_too_long() {
        let long = "road ".repeat(50);
        assert!(matches!(
            validate_location(&long),
            Err(FieldError::TooLong { max: 200, .. })
        ));
    }

    #[test]
    fn test_schedule_has_no_upper_bound() {
        assert!(validate_schedule("Mon").is_err());
        assert_eq!(validate_schedule(&"weekday mornings ".repeat(100)), Ok(()));
    }

    #[rstest]
    #[case("10,000 - 20,000", true)]
    #[case("", true)]
    #[case("   ", true)]
    #[case("5000", true)]
    #[case("about $10k", false)]
    #[case("10k-20k", false)]
    fn test_budget(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(validate_budget(input).is_ok(), valid);
    }

    #[rstest]
    #[case("<script>alert(1)</script>")]
    #[case("click JavaScript:void(0)")]
    #[case("img onerror = x")]
    #[case("data:text/html;base64,xx")]
    #[case("eval(code)")]
    #[case("width: expression(alert)")]
    fn test_todo_text_rejects_injection(#[case] input: &str) {
        assert_eq!(
            validate_todo_text(input),
            Err(FieldError::ForbiddenContent { field: Field::TodoText })
        );
    }

    #[test]
    fn test_todo_text_basic_rules() {
        assert_eq!(validate_todo_text("Buy washers"), Ok(()));
        assert_eq!(
            validate_todo_text(" \t "),
            Err(FieldError::Required { field: Field::TodoText })
        );
        assert_eq!(
            validate_todo_text(&"a b ".repeat(130)),
            Err(FieldError::TooLong { field: Field::TodoText, max: 500 })
        );
    }

    #[test]
    fn test_todo_text_repetition() {
        assert_eq!(
            validate_todo_text(&"a".repeat(11)),
            Err(FieldError::ExcessiveRepetition { field: Field::TodoText })
        );
        assert_eq!(
            validate_todo_text(&format!("call {}", "ha".repeat(12))),
            Err(FieldError::ExcessiveRepetition { field: Field::TodoText })
        );
        // ten occurrences in total is still fine
        assert_eq!(validate_todo_text(&"a".repeat(10)), Ok(()));
        assert_eq!(validate_todo_text(&format!("x{}", "ab".repeat(10))), Ok(()));
    }

    #[test]
    fn test_repetition_ignores_line_breaks() {
        assert!(!has_excessive_repetition(&"\n".repeat(20)));
        assert!(has_excessive_repetition(&format!("line\n{}", "-".repeat(11))));
    }

    #[test]
    fn test_email_and_password() {
        assert_eq!(validate_email("pro@example.com"), Ok(()));
        assert_eq!(
            validate_email("pro@example"),
            Err(FieldError::InvalidFormat { field: Field::Email })
        );
        assert_eq!(validate_email(""), Err(FieldError::Required { field: Field::Email }));
        assert_eq!(validate_password("abc"), Ok(()));
        assert!(matches!(
            validate_password("ab"),
            Err(FieldError::TooShort { field: Field::Password, .. })
        ));
    }

    #[test]
    fn test_form_errors_collects_per_field() {
        let mut errors = FormErrors::new();
        errors.check(validate_job_title("AB"));
        errors.check(validate_location("Taipei City"));
        errors.check(validate_budget("cheap"));

        assert_eq!(errors.len(), 2);
        assert!(errors.get(Field::Location).is_none());
        assert!(matches!(
            errors.get(Field::Budget),
            Some(FieldError::InvalidFormat { .. })
        ));
        assert!(errors.to_string().contains("title"));
    }
}
