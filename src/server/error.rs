//! Error types for the server

use crate::error::StarlinerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StarlinerError> for ServerError {
    fn from(err: StarlinerError) -> Self {
        match err {
            StarlinerError::ValidationError(msg) => ServerError::Validation(msg),
            StarlinerError::ModelError(msg) => ServerError::Model(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

/// Every failure is answered with status 200 and an `{"error": message}` body
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match &self {
            ServerError::Validation(_) => {
                tracing::warn!(detail = %message, "Rejected prediction request");
            }
            ServerError::Model(_) | ServerError::Internal(_) => {
                tracing::error!(detail = %message, "Prediction failed");
            }
        }

        (StatusCode::OK, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_crate_error() {
        let err: ServerError = StarlinerError::ValidationError("Missing columns: Deck".into()).into();
        assert_eq!(err.to_string(), "Missing columns: Deck");

        let err: ServerError = StarlinerError::ModelError("boom".into()).into();
        assert_eq!(err.to_string(), "Model error: boom");
    }

    #[test]
    fn test_error_response_is_ok_status() {
        let response = ServerError::Validation("Null values: Age: 1".into()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
