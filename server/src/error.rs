//! The single failure type handlers return, and its translation to HTTP.
//!
//! # Design
//! Each `ApiError` carries its own status code (`ApiError::status`), and the
//! `IntoResponse` impl reads it from there. Nothing is attached to the
//! response out of band, so a handler that means 400 gets 400. Every failure,
//! including a caught panic, renders the same `ErrorEnvelope`.

use std::any::Any;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::envelope::ErrorEnvelope;
use crate::store::StoreError;

pub const MISSING_FIELDS: &str = "Title and description are required";
pub const TODO_NOT_FOUND: &str = "No todo found by this ID";
pub const DUPLICATE_TITLE: &str = "A todo with this title already exists";
pub const INVALID_ID: &str = "Invalid ID";
pub const INVALID_TITLE: &str = "Invalid title";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Required input is missing. 400.
    #[error("{message}")]
    Validation { message: String, cause: String },

    /// A lookup by id found nothing. 400, not 404.
    #[error("{message}")]
    NotFound { message: String, cause: String },

    /// The datastore rejected a write that would break title uniqueness. 409.
    #[error("{message}")]
    Conflict { message: String, cause: String },

    /// The request body was not the JSON we expected.
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    /// A path parameter could not be parsed, e.g. a non-numeric id.
    #[error(transparent)]
    InvalidPath(#[from] PathRejection),

    /// The `:title` segment did not decode, e.g. invalid UTF-8.
    #[error(transparent)]
    InvalidTitle(PathRejection),

    #[error("Route not found")]
    RouteNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Database(sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing_fields() -> Self {
        ApiError::Validation {
            message: MISSING_FIELDS.to_string(),
            cause: "Missing title or description".to_string(),
        }
    }

    pub fn todo_not_found() -> Self {
        ApiError::NotFound {
            message: TODO_NOT_FOUND.to_string(),
            cause: INVALID_ID.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. }
            | ApiError::NotFound { .. }
            | ApiError::InvalidPath(_)
            | ApiError::InvalidTitle(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            ApiError::Validation { cause, .. }
            | ApiError::NotFound { cause, .. }
            | ApiError::Conflict { cause, .. } => Some(cause),
            ApiError::InvalidBody(_) => Some("Invalid JSON body"),
            ApiError::InvalidPath(_) => Some(INVALID_ID),
            ApiError::InvalidTitle(_) => Some(INVALID_TITLE),
            ApiError::RouteNotFound
            | ApiError::MethodNotAllowed
            | ApiError::Database(_)
            | ApiError::Internal(_) => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateTitle => ApiError::Conflict {
                message: DUPLICATE_TITLE.to_string(),
                cause: "Duplicate title".to_string(),
            },
            StoreError::Sqlx(e) => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }

        let body = ErrorEnvelope {
            error: true,
            message: self.to_string(),
            cause: self.cause().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}

/// Response for a handler that panicked, used with `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(detail).into_response()
}
