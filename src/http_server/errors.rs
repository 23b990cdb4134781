//! # HTTP Server Errors

use thiserror::Error;

/// Result type for server setup and lifecycle
pub type HttpServerResult<T> = Result<T, HttpServerError>;

/// HTTP server errors
#[derive(Debug, Error)]
pub enum HttpServerError {
    #[error("Invalid listen address '{0}'")]
    InvalidListenAddr(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}
