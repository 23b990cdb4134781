//! # Routing Errors

use thiserror::Error;

/// Result type for routing operations
pub type RoutingResult<T> = Result<T, RoutingError>;

/// Routing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Zero bucket count, empty node list, malformed node address
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RoutingError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            RoutingError::InvalidArgument(_) => 400,
        }
    }
}
