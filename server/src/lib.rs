//! HTTP API for a SQLite-backed todo list.
//!
//! # Overview
//! Six routes under `/` list, create, look up (by id or by title), update and
//! delete todos. Every response body is a JSON envelope with an `error` flag.
//!
//! # Design
//! - `TodoStore` is built by the caller and injected as router state; there
//!   is no global connection.
//! - Handlers return `Result<_, ApiError>`. The error carries its status
//!   code and is rendered once, in `ApiError::into_response`.
//! - Cross-cutting layers: permissive CORS, a per-request trace event with
//!   a UTC timestamp, and panic catching so a bad request cannot take the
//!   process down.

pub mod config;
pub mod envelope;
pub mod error;
pub mod model;
pub mod routes;
pub mod store;

use axum::{extract::Request, Router};
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

pub use config::Config;
pub use envelope::{DataEnvelope, ErrorEnvelope, ResultEnvelope};
pub use error::ApiError;
pub use model::{NewTodo, Todo, TodoChanges, TodoList};
pub use store::{StoreError, TodoStore};

pub fn app(store: TodoStore) -> Router {
    let trace = TraceLayer::new_for_http().on_request(|request: &Request, _span: &Span| {
        tracing::info!(
            method = %request.method(),
            uri = %request.uri(),
            at = %Utc::now().to_rfc3339(),
            "request received"
        );
    });

    routes::router()
        .with_state(store)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(trace)
        .layer(CorsLayer::permissive())
}

pub async fn run(listener: TcpListener, store: TodoStore) -> Result<(), std::io::Error> {
    axum::serve(listener, app(store)).await
}
