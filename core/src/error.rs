//! Error types for the todo API client.
//!
//! # Design
//! The server answers every failure with an `{error: true, message, cause}`
//! envelope, so `Api` keeps those fields next to the status code. A body
//! that is not such an envelope lands in `HttpError` with the raw text.

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server reported a failure through its error envelope.
    #[error("HTTP {status}: {message}")]
    Api {
        status: u16,
        message: String,
        cause: Option<String>,
    },

    /// The server returned an unexpected status without an error envelope.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::HttpError { status, .. } => Some(*status),
            ApiError::DeserializationError(_) | ApiError::SerializationError(_) => None,
        }
    }
}
