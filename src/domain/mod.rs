//! Domain Layer
//!
//! Contains all domain entities, their validation rules and core abstractions.
//! This layer does no I/O.

mod clock;
mod entity;
mod job;
mod professional;
pub mod seed;
pub mod task;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::{position_of, require_position, DomainError, DomainResult, Entity};
pub use job::{
    Job, JobForm, JobStatus, JobUpdate, Locale, LocalizedText, TimelineEntry, TimelineKind,
    Urgency,
};
pub use professional::{Professional, VerificationLevel};
pub use task::{Task, TaskCounts, TaskError, TaskFilter};
pub use validation::{Field, FieldError, FieldResult, FormErrors};
