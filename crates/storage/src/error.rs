//! Storage error types

use thiserror::Error;

/// Errors surfaced by the versioned store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Another unit of work committed the record after this one read it
    #[error("concurrent commit rejected for {0}")]
    Conflict(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
