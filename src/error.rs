//! Error taxonomy for lineage operations

use thiserror::Error;

/// Errors that can occur in lineage operations
#[derive(Debug, Error)]
pub enum LineageError {
    /// Bad, missing, or duplicate identifiers; invalid domain/boundary
    /// references; duplicate version numbers.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced node, root, or content id is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Stored content failed schema or record-type discriminator lookup.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Signature mismatch or dangling reference discovered during verification.
    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for lineage operations
pub type LineageResult<T> = Result<T, LineageError>;

impl LineageError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a missing-identifier failure.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
