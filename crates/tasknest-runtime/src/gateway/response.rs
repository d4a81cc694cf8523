use std::collections::BTreeMap;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tasknest_core::dto::Created;
use tasknest_core::validation::field_messages;
use tasknest_core::TaskNestError;
use uuid::Uuid;

/// Structured error body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Field messages keyed by lowercased field name.
    #[serde(default)]
    pub validations: BTreeMap<String, String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            validations: BTreeMap::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found")
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred.",
        )
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<TaskNestError> for ApiError {
    fn from(err: TaskNestError) -> Self {
        match err {
            TaskNestError::Validation(errors) => Self {
                validations: field_messages(&errors),
                ..Self::bad_request("One or more validation errors occurred.")
            },
            TaskNestError::NotFound(detail) => {
                tracing::debug!(%detail, "Resource not found");
                Self::not_found()
            }
            TaskNestError::BadRequest(msg)
            | TaskNestError::Integrity(msg)
            | TaskNestError::Constraint(msg) => Self::bad_request(msg),
            TaskNestError::Unauthorized(msg) => Self::unauthorized(msg),
            other @ (TaskNestError::Config(_)
            | TaskNestError::Database(_)
            | TaskNestError::Io(_)
            | TaskNestError::Internal(_)) => {
                tracing::error!(error = %other, "Request failed");
                Self::internal()
            }
        }
    }
}

/// Result type of every handler.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// 201 with a `Location` header and `{guid}` body.
pub fn created(collection: &str, guid: Uuid) -> Response {
    let location = format!("{}/{}", collection.trim_end_matches('/'), guid);
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(Created { guid }),
    )
        .into_response()
}
