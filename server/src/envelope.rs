//! JSON envelopes wrapped around every response body.
//!
//! Successful responses carry `error: false` next to a `data` (or, for the
//! single-todo lookup, `result`) field. Failures carry `error: true` with a
//! human-readable `message` and an optional `cause`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub error: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { error: false, data }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub error: bool,
    pub result: T,
}

impl<T> ResultEnvelope<T> {
    pub fn new(result: T) -> Self {
        Self {
            error: false,
            result,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}
