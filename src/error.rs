//! Typed errors per layer and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors raised by the paging model and the repositories.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown sort key '{key}' for {model}")]
    UnknownSortKey { model: &'static str, key: String },
    #[error("unsupported model type: {0}")]
    UnsupportedModelType(String),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("document store: {0}")]
    Document(#[from] sled::Error),
    #[error("session already committed")]
    SessionClosed,
    #[error("blocking task: {0}")]
    Task(String),
}

impl DataError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DataError::InvalidArgument(message.into())
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{model} '{id}' not found")]
    EntityNotFound { model: &'static str, id: String },
    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },
    #[error(transparent)]
    Data(DataError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure on a single request field (`query.page`, `body`, ...).
    pub fn invalid_field(location: &str, field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        AppError::Validation {
            details: Some(serde_json::json!([{
                "loc": [location, field],
                "msg": message,
            }])),
            message: format!("{}: {}", field, message),
        }
    }

    /// Validation failure on the request body as a whole.
    pub fn invalid_body(message: impl Into<String>) -> Self {
        let message = message.into();
        AppError::Validation {
            details: Some(serde_json::json!([{
                "loc": ["body"],
                "msg": message,
            }])),
            message,
        }
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::InvalidArgument(message) => AppError::Validation {
                message,
                details: None,
            },
            DataError::UnknownSortKey { .. } => AppError::invalid_field("query", "sort", err.to_string()),
            other => AppError::Data(other),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::EntityNotFound { .. } => AppError::NotFound(err.to_string()),
            ServiceError::Data(e) => e.into(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Data(DataError::UnsupportedModelType(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "unsupported_model")
            }
            AppError::Data(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let message = self.to_string();
        let details = match self {
            AppError::Validation { details, .. } => details,
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_not_found_maps_to_404() {
        let err: AppError = ServiceError::EntityNotFound { model: "note", id: "7".into() }.into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_argument_and_unknown_sort_key_map_to_422() {
        let err: AppError = DataError::invalid_argument("size must be greater than 0").into();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: AppError = ServiceError::Data(DataError::UnknownSortKey {
            model: "note",
            key: "colour".into(),
        })
        .into();
        assert!(matches!(err, AppError::Validation { details: Some(_), .. }));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn backend_failures_map_to_500() {
        let err: AppError = DataError::SessionClosed.into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = DataError::UnsupportedModelType("expected an object".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
