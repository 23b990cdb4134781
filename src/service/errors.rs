//! # Service Errors
//!
//! Error surface of the storage service. Lower layers convert into these
//! five categories; the HTTP layer renders them as `{"error", "code"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::namespace::StoreError;
use crate::observability::Event;
use crate::routing::RoutingError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Bad name, bad pagination, unparseable input
    #[error("{0}")]
    InvalidArgument(String),

    /// Insert-only write on an existing key
    #[error("{0}")]
    Conflict(String),

    /// Unknown namespace or absent key
    #[error("{0}")]
    NotFound(String),

    /// Storage engine failure or corrupted payload
    #[error("{0}")]
    Internal(String),

    /// Stream broker unreachable; never returned from a write
    #[error("{0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::Conflict(_) => 409,
            ServiceError::NotFound(_) => 404,
            ServiceError::Internal(_) => 500,
            ServiceError::Unavailable(_) => 503,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::InvalidName(_) | StoreError::InvalidArgument(_) => {
                ServiceError::InvalidArgument(message)
            }
            StoreError::NamespaceNotFound(_) | StoreError::KeyNotFound { .. } => {
                ServiceError::NotFound(message)
            }
            StoreError::KeyExists { .. } => ServiceError::Conflict(message),
            StoreError::Sqlite(_) | StoreError::Io(_) | StoreError::LockPoisoned => {
                ServiceError::Internal(message)
            }
        }
    }
}

impl From<RoutingError> for ServiceError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        // Panic payloads stay in the log, never in the response body
        tracing::error!(event = %Event::StorageTaskFailed, error = %err);
        ServiceError::Internal("storage task failed".to_string())
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::InvalidArgument("x".into()).status_code(), 400);
        assert_eq!(ServiceError::Conflict("x".into()).status_code(), 409);
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ServiceError::Internal("x".into()).status_code(), 500);
        assert_eq!(ServiceError::Unavailable("x".into()).status_code(), 503);
    }

    #[test]
    fn test_store_error_conversion() {
        let err: ServiceError = StoreError::KeyExists {
            namespace: "default".into(),
            key: "a".into(),
        }
        .into();
        assert_eq!(err.status_code(), 409);

        let err: ServiceError = StoreError::NamespaceNotFound("logs".into()).into();
        assert!(err.is_not_found());

        let err: ServiceError = StoreError::InvalidName("a.b".into()).into();
        assert_eq!(err.status_code(), 400);

        let err: ServiceError = StoreError::LockPoisoned.into();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_routing_error_conversion() {
        let err: ServiceError = RoutingError::InvalidArgument("no nodes".into()).into();
        assert_eq!(err, ServiceError::InvalidArgument("no nodes".into()));
    }

    #[tokio::test]
    async fn test_panicked_task_hides_payload() {
        let join_err = tokio::spawn(async { panic!("attempt to multiply with overflow") })
            .await
            .unwrap_err();
        let err: ServiceError = join_err.into();
        assert_eq!(err, ServiceError::Internal("storage task failed".into()));
    }

    #[test]
    fn test_into_response_status() {
        let response = ServiceError::Conflict("exists".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
