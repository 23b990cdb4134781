//! # Change Notifier Errors
//!
//! Every notifier failure is non-fatal to the write that produced the
//! event; these errors are logged at the orchestration boundary and never
//! returned to an HTTP caller of a write.

use thiserror::Error;

/// Result type for notifier operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Notifier errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Broker unreachable or refused the command
    #[error("Stream broker unavailable: {0}")]
    Unavailable(String),

    /// Broker replied with an error
    #[error("Stream broker error: {0}")]
    Broker(#[from] redis::RedisError),

    /// Entry could not be decoded into a change event
    #[error("Malformed stream entry {id}: {reason}")]
    MalformedEntry { id: String, reason: String },
}

impl NotifyError {
    /// Get HTTP status code, for the rare surfaces that expose it
    pub fn status_code(&self) -> u16 {
        match self {
            NotifyError::Unavailable(_) => 503,
            NotifyError::Broker(_) => 503,
            NotifyError::MalformedEntry { .. } => 500,
        }
    }
}
