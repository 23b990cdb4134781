//! CLI-specific error types
//!
//! All CLI errors are fatal: `main` prints them and exits non-zero.

use std::fmt;

use crate::http_server::HttpServerError;
use crate::notifier::NotifyError;
use crate::observability::ObservabilityError;
use crate::routing::RoutingError;
use crate::service::ServiceError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Invalid flag or environment value
    ConfigError,
    /// Startup failed (store, broker, logging)
    BootFailed,
    /// Server stopped with an error
    ServeFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "RAWSTORE_CLI_CONFIG_ERROR",
            Self::BootFailed => "RAWSTORE_CLI_BOOT_FAILED",
            Self::ServeFailed => "RAWSTORE_CLI_SERVE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Serving failed
    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<RoutingError> for CliError {
    fn from(e: RoutingError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        Self::boot_failed(format!("Failed to open namespace store: {}", e))
    }
}

impl From<NotifyError> for CliError {
    fn from(e: NotifyError) -> Self {
        Self::boot_failed(format!("Failed to connect to stream broker: {}", e))
    }
}

impl From<ObservabilityError> for CliError {
    fn from(e: ObservabilityError) -> Self {
        Self::boot_failed(e.to_string())
    }
}

impl From<HttpServerError> for CliError {
    fn from(e: HttpServerError) -> Self {
        match e {
            HttpServerError::InvalidListenAddr(_) => Self::config_error(e.to_string()),
            HttpServerError::Bind { .. } => Self::boot_failed(e.to_string()),
            HttpServerError::Serve(_) => Self::serve_failed(e.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
