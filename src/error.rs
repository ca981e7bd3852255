//! Error types for the reconciliation engine.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during engine operation.
///
/// Amount parsing has no error variant: unparseable input reads as zero.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Input violates a record invariant; nothing was written
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The subject does not exist; nothing was written
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    /// Persistence is unreachable; safe to retry
    #[error("Connection failure: {0}")]
    Connection(String),

    /// A generated code collided with an existing one; regenerate and retry
    #[error("Duplicate code: {0}")]
    DuplicateCode(String),

    /// Writing audit entries failed after the primary write committed
    #[error("Audit write failed: {0}")]
    AuditWrite(String),

    /// Any other persistence failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Shorthand for a validation failure.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns `true` if the caller may retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Connection(_) | EngineError::DuplicateCode(_)
        )
    }
}
