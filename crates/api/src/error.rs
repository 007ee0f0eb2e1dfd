//! Application error types and HTTP error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::services::CheckoutError;
use crate::services::gate::GateError;
use crate::store::RepositoryError;

/// Application error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage-layer error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Request input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid access token.
    #[error("unauthorized")]
    Unauthorized,

    /// Requested resource does not exist.
    #[error("not found")]
    NotFound,

    /// The request was syntactically valid but cannot be honored.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(msg) => Self::Validation(msg),
            CheckoutError::Repository(e) => Self::Repository(e),
        }
    }
}

impl From<GateError> for AppError {
    fn from(_: GateError) -> Self {
        Self::Unauthorized
    }
}

impl AppError {
    /// Map to an HTTP status and a client-safe message. Internal details
    /// never reach the response body.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Repository(repo) => match repo {
                RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
                RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                RepositoryError::OutOfRangeItem { .. } => {
                    (StatusCode::BAD_REQUEST, repo.to_string())
                }
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Please authenticate using a valid token".to_string(),
            ),
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            sentry::capture_error(&self);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use buyit_core::ProductId;

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, _) = AppError::NotFound.status_and_message();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            AppError::Repository(RepositoryError::NotFound).status_and_message();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_out_of_range_item_maps_to_400() {
        let err = AppError::Repository(RepositoryError::OutOfRangeItem {
            product_id: ProductId::new(301),
            capacity: 300,
        });
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("301"));
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err = AppError::Repository(RepositoryError::Conflict(
            "email already registered".to_string(),
        ));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "email already registered");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Repository(RepositoryError::DataCorruption(
            "row 17 has a negative price".to_string(),
        ));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
        assert!(!message.contains("row 17"));
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let (status, _) = AppError::Unauthorized.status_and_message();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let from_gate: AppError = GateError::BadSignature.into();
        let (status, _) = from_gate.status_and_message();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
