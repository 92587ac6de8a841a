//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate collection name: {0}")]
    DuplicateCollection(String),
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("invalid identifier for {kind}: '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Storage-layer failures. Route groups translate `NotFound`, `DuplicateKey` and
/// `Conflict` where the operation expects them; everything else is opaque.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found: {collection}/{key}")]
    NotFound { collection: String, key: String },
    #[error("unique constraint violated: {collection}/{key}")]
    DuplicateKey { collection: String, key: String },
    #[error("conflict, _rev values do not match: {collection}/{key}")]
    Conflict { collection: String, key: String },
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    #[error("duplicate collection name: {0}")]
    DuplicateCollection(String),
    #[error("invalid edge attribute in collection {0}")]
    InvalidEdge(String),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        // Engine errors are logged, never echoed to the client.
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "unhandled storage error");
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: ErrorDetail { code, message } })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_opaque_500s() {
        let err = AppError::from(StoreError::CollectionNotFound("land".into()));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn translated_errors_keep_their_status() {
        assert_eq!(AppError::NotFound("k".into()).status_and_code().0, StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("k".into()).status_and_code().0, StatusCode::CONFLICT);
        assert_eq!(
            AppError::Validation("k".into()).status_and_code().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::BadRequest("k".into()).status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::PayloadTooLarge("k".into()).status_and_code().0,
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
