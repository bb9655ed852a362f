//! Error types for the store boundary.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur at the storage boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The transaction id is unknown or already closed.
    #[error("no such transaction: {0}")]
    NoSuchTransaction(u64),

    /// The entity id resolves to neither a node nor a relationship.
    #[error("no such entity: {0}")]
    NoSuchEntity(String),

    /// The node exists but carries no file content.
    #[error("not a file node: {0}")]
    NotAFile(String),

    /// I/O failure in a file-backed implementation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Implementation-specific failure.
    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Creates an implementation-specific error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
