//! # Namespace Store Errors

use thiserror::Error;

/// Result type for namespace store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Namespace store errors
#[derive(Debug, Error)]
pub enum StoreError {
    // Namespace errors
    #[error("Invalid namespace name: {0}")]
    InvalidName(String),

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    // Record errors
    #[error("Key not found: {namespace}/{key}")]
    KeyNotFound { namespace: String, key: String },

    #[error("Key already exists: {namespace}/{key}")]
    KeyExists { namespace: String, key: String },

    // Validation errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Engine errors
    #[error("Storage engine error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::InvalidName(_) => 400,
            StoreError::NamespaceNotFound(_) => 404,
            StoreError::KeyNotFound { .. } => 404,
            StoreError::KeyExists { .. } => 409,
            StoreError::InvalidArgument(_) => 400,
            StoreError::Sqlite(_) => 500,
            StoreError::Io(_) => 500,
            StoreError::LockPoisoned => 500,
        }
    }

    /// True for the two "absent" conditions
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NamespaceNotFound(_) | StoreError::KeyNotFound { .. }
        )
    }
}
