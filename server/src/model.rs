//! The todo record and the shapes used to create and change it.
//!
//! # Design
//! `Todo` is both the row type decoded by sqlx and the JSON body returned to
//! clients, so the column names and the JSON field names are the same
//! camelCase identifiers (`isDone`, `createdAt`, `updatedAt`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A single persisted todo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// -1 low, 0 medium, 1 high. The range is not enforced.
    pub priority: i16,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when inserting a todo. `priority` falls back to 0.
#[derive(Clone, Debug)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i16>,
}

/// Fields accepted by an update. Absent fields keep their stored value.
///
/// `description` distinguishes an absent key (`None`) from an explicit
/// `null` (`Some(None)`), which clears the stored description. `title` is
/// non-nullable, so `null` there counts as absent.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TodoChanges {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Every stored todo plus how many there are.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TodoList {
    pub count: usize,
    pub rows: Vec<Todo>,
}

impl From<Vec<Todo>> for TodoList {
    fn from(rows: Vec<Todo>) -> Self {
        Self {
            count: rows.len(),
            rows,
        }
    }
}
