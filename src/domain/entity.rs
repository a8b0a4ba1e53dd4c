//! Domain Layer - Core Entity Trait
//!
//! Every record kept in a list has a stable identifier; lookups by id go
//! through the helpers here so "not found" reads the same everywhere.

use std::fmt::Display;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// Human-readable name of the record kind, used in errors
    const KIND: &'static str;

    /// The type of the entity's unique identifier
    type Id: ?Sized + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> &Self::Id;
}

/// Index of the entity with `id` in `list`, if any
pub fn position_of<T: Entity>(list: &[T], id: &T::Id) -> Option<usize> {
    list.iter().position(|entity| entity.id() == id)
}

/// Like `position_of`, but a missing entity is an error
pub fn require_position<T: Entity>(list: &[T], id: &T::Id) -> DomainResult<usize>
where
    T::Id: Display,
{
    position_of(list, id).ok_or_else(|| DomainError::NotFound {
        kind: T::KIND,
        id: id.to_string(),
    })
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}
