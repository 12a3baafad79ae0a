//! Route table and handlers for the todo API.
//!
//! Handlers validate their input, call `TodoStore`, and wrap the outcome in
//! an envelope. They never build error responses themselves; every failure
//! is returned as an `ApiError`.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::envelope::{DataEnvelope, ResultEnvelope};
use crate::error::ApiError;
use crate::model::{NewTodo, Todo, TodoChanges, TodoList};
use crate::store::TodoStore;

/// Body of `POST /`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i16>,
}

impl CreateTodoBody {
    /// An empty body, or one not sent as JSON, reads as `{}`. A JSON body
    /// that fails to parse is still rejected.
    pub fn from_request_parts(headers: &HeaderMap, body: &[u8]) -> Result<Self, ApiError> {
        if body.is_empty() || !has_json_content_type(headers) {
            return Ok(Self::default());
        }
        let Json(body) = Json::<Self>::from_bytes(body)?;
        Ok(body)
    }

    /// Missing, null and empty `title`/`description` are all treated as absent.
    pub fn into_new_todo(self) -> Result<NewTodo, ApiError> {
        match (non_empty(self.title), non_empty(self.description)) {
            (Some(title), Some(description)) => Ok(NewTodo {
                title,
                description: Some(description),
                priority: self.priority,
            }),
            _ => Err(ApiError::missing_fields()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };
    kind.eq_ignore_ascii_case("application")
        && (subtype.eq_ignore_ascii_case("json") || subtype.to_ascii_lowercase().ends_with("+json"))
}

pub fn router() -> Router<TodoStore> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/title/{title}", get(get_todo_by_title))
        .route("/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
}

async fn list_todos(
    State(store): State<TodoStore>,
) -> Result<Json<DataEnvelope<TodoList>>, ApiError> {
    let list = store.list_all().await?;
    Ok(Json(DataEnvelope::new(list)))
}

async fn create_todo(
    State(store): State<TodoStore>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<DataEnvelope<Todo>>), ApiError> {
    let body = body.map_err(JsonRejection::from)?;
    let body = CreateTodoBody::from_request_parts(&headers, &body)?;
    let todo = store.create(body.into_new_todo()?).await?;
    tracing::info!(id = todo.id, title = %todo.title, "todo created");
    Ok((StatusCode::CREATED, Json(DataEnvelope::new(todo))))
}

async fn get_todo(
    State(store): State<TodoStore>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ResultEnvelope<Todo>>, ApiError> {
    let Path(id) = id?;
    let todo = store
        .find_by_id(id)
        .await?
        .ok_or_else(ApiError::todo_not_found)?;
    Ok(Json(ResultEnvelope::new(todo)))
}

// A miss is not an error here: the body is `data: null` with 200.
async fn get_todo_by_title(
    State(store): State<TodoStore>,
    title: Result<Path<String>, PathRejection>,
) -> Result<Json<DataEnvelope<Option<Todo>>>, ApiError> {
    let Path(title) = title.map_err(ApiError::InvalidTitle)?;
    let todo = store.find_by_title(&title).await?;
    Ok(Json(DataEnvelope::new(todo)))
}

async fn update_todo(
    State(store): State<TodoStore>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<TodoChanges>, JsonRejection>,
) -> Result<Json<DataEnvelope<u64>>, ApiError> {
    let Path(id) = id?;
    let Json(changes) = body?;
    let updated = store.update_by_id(id, changes).await?;
    Ok(Json(DataEnvelope::new(updated)))
}

async fn delete_todo(
    State(store): State<TodoStore>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DataEnvelope<u64>>, ApiError> {
    let Path(id) = id?;
    let deleted = store.delete_by_id(id).await?;
    Ok(Json(DataEnvelope::new(deleted)))
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
