//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url`. Each route has a `build_*` method
//! that produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Successful bodies are wrapped in an envelope whose payload
//! sits under `data` (or `result` for the by-id lookup); the parsers strip
//! it so callers only see domain types.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Todo, TodoList, UpdateTodo};

#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
struct Found<T> {
    result: T,
}

#[derive(Deserialize)]
struct Failure {
    error: bool,
    message: String,
    #[serde(default)]
    cause: Option<String>,
}

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        bare(HttpMethod::Get, self.url("/"))
    }

    pub fn build_get_todo(&self, id: i64) -> HttpRequest {
        bare(HttpMethod::Get, self.url(&format!("/{id}")))
    }

    /// The title is percent-encoded into the path.
    pub fn build_get_todo_by_title(&self, title: &str) -> HttpRequest {
        let path = format!("/title/{}", urlencoding::encode(title));
        bare(HttpMethod::Get, self.url(&path))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        with_json(HttpMethod::Post, self.url("/"), input)
    }

    pub fn build_update_todo(&self, id: i64, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        with_json(HttpMethod::Put, self.url(&format!("/{id}")), input)
    }

    pub fn build_delete_todo(&self, id: i64) -> HttpRequest {
        bare(HttpMethod::Delete, self.url(&format!("/{id}")))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<TodoList, ApiError> {
        check_status(&response, 200)?;
        decode::<Data<TodoList>>(&response).map(|e| e.data)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        decode::<Found<Todo>>(&response).map(|e| e.result)
    }

    /// `None` when no todo carries that exact title.
    pub fn parse_get_todo_by_title(&self, response: HttpResponse) -> Result<Option<Todo>, ApiError> {
        check_status(&response, 200)?;
        decode::<Data<Option<Todo>>>(&response).map(|e| e.data)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 201)?;
        decode::<Data<Todo>>(&response).map(|e| e.data)
    }

    /// Number of rows the server updated (0 or 1).
    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<u64, ApiError> {
        check_status(&response, 200)?;
        decode::<Data<u64>>(&response).map(|e| e.data)
    }

    /// Number of rows the server deleted (0 or 1).
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<u64, ApiError> {
        check_status(&response, 200)?;
        decode::<Data<u64>>(&response).map(|e| e.data)
    }
}

fn bare(method: HttpMethod, path: String) -> HttpRequest {
    HttpRequest {
        method,
        path,
        headers: Vec::new(),
        body: None,
    }
}

fn with_json<T: serde::Serialize>(
    method: HttpMethod,
    path: String,
    input: &T,
) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
    Ok(HttpRequest {
        method,
        path,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map an unexpected status to `Api` when the body is an error envelope,
/// otherwise to `HttpError`.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    match serde_json::from_str::<Failure>(&response.body) {
        Ok(failure) if failure.error => Err(ApiError::Api {
            status: response.status,
            message: failure.message,
            cause: failure.cause,
        }),
        _ => Err(ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODO_JSON: &str = r#"{"id":1,"title":"Test","description":"d","priority":0,"isDone":false,"createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-01T10:00:00Z"}"#;

    fn client() -> TodoClient {
        TodoClient::new("http://localhost:3000")
    }

    #[test]
    fn build_list_todos_produces_correct_request() {
        let req = client().build_list_todos();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_get_todo_produces_correct_request() {
        let req = client().build_get_todo(42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/42");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_get_todo_by_title_encodes_title() {
        let req = client().build_get_todo_by_title("Buy milk/eggs");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/title/Buy%20milk%2Feggs");
    }

    #[test]
    fn build_create_todo_produces_correct_request() {
        let input = CreateTodo {
            title: "Buy milk".to_string(),
            description: "2 litres".to_string(),
            priority: None,
        };
        let req = client().build_create_todo(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Buy milk");
        assert_eq!(body["description"], "2 litres");
        assert!(body.get("priority").is_none());
    }

    #[test]
    fn build_update_todo_skips_absent_fields() {
        let input = UpdateTodo {
            title: Some("Updated".to_string()),
            description: None,
        };
        let req = client().build_update_todo(3, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/3");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Updated");
        assert!(body.get("description").is_none());
    }

    #[test]
    fn build_delete_todo_produces_correct_request() {
        let req = client().build_delete_todo(9);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:3000/9");
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_list_todos_success() {
        let body = format!(r#"{{"error":false,"data":{{"count":1,"rows":[{TODO_JSON}]}}}}"#);
        let list = client().parse_list_todos(HttpResponse::new(200, body)).unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.rows[0].title, "Test");
        assert!(!list.rows[0].is_done);
    }

    #[test]
    fn parse_get_todo_reads_result_field() {
        let body = format!(r#"{{"error":false,"result":{TODO_JSON}}}"#);
        let todo = client().parse_get_todo(HttpResponse::new(200, body)).unwrap();
        assert_eq!(todo.id, 1);
        assert_eq!(todo.description.as_deref(), Some("d"));
    }

    #[test]
    fn parse_get_todo_not_found_envelope() {
        let body = r#"{"error":true,"message":"No todo found by this ID","cause":"Invalid ID"}"#;
        let err = client().parse_get_todo(HttpResponse::new(400, body)).unwrap_err();
        match err {
            ApiError::Api { status, message, cause } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No todo found by this ID");
                assert_eq!(cause.as_deref(), Some("Invalid ID"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_get_todo_by_title_null_is_none() {
        let body = r#"{"error":false,"data":null}"#;
        let todo = client()
            .parse_get_todo_by_title(HttpResponse::new(200, body))
            .unwrap();
        assert!(todo.is_none());
    }

    #[test]
    fn parse_create_todo_success() {
        let body = format!(r#"{{"error":false,"data":{TODO_JSON}}}"#);
        let todo = client().parse_create_todo(HttpResponse::new(201, body)).unwrap();
        assert_eq!(todo.title, "Test");
        assert_eq!(todo.priority, 0);
    }

    #[test]
    fn parse_create_todo_wrong_status() {
        let err = client()
            .parse_create_todo(HttpResponse::new(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn parse_update_and_delete_counts() {
        let c = client();
        let one = r#"{"error":false,"data":1}"#;
        let zero = r#"{"error":false,"data":0}"#;
        assert_eq!(c.parse_update_todo(HttpResponse::new(200, one)).unwrap(), 1);
        assert_eq!(c.parse_delete_todo(HttpResponse::new(200, zero)).unwrap(), 0);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TodoClient::new("http://localhost:3000/");
        let req = client.build_get_todo(1);
        assert_eq!(req.path, "http://localhost:3000/1");
    }

    #[test]
    fn parse_list_todos_bad_json() {
        let err = client()
            .parse_list_todos(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
        assert_eq!(err.status(), None);
    }
}
