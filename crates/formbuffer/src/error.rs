#![forbid(unsafe_code)]

//! Error taxonomy for the edit buffer.
//!
//! Every failure is local, synchronous and propagated directly to the
//! caller; nothing is swallowed or retried. Commit and rollback are atomic
//! batches, so there are no partial-failure states to report.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewModelError {
    /// A model was constructed from a JSON value that is not an object.
    #[error("model is not an object (got {found})")]
    InvalidModel { found: &'static str },

    /// An operation named a field that was not captured at construction.
    #[error("unknown field: {name}")]
    UnknownField { name: String },

    /// A model field name collides with a reserved view-model API name.
    /// Construction fails fast rather than silently skipping the field.
    #[error("field name collides with a reserved view-model name: {name}")]
    ReservedNameCollision { name: String },
}

impl ViewModelError {
    #[must_use]
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    #[must_use]
    pub fn reserved(name: impl Into<String>) -> Self {
        Self::ReservedNameCollision { name: name.into() }
    }
}
