//! SQLite persistence for todos.
//!
//! # Design
//! `TodoStore` owns an `SqlitePool` and is handed to the router as state, so
//! tests can build one over an in-memory database instead of a file. All
//! queries are single statements matched on exact equality; nothing spans a
//! transaction. The datastore enforces title uniqueness, and that violation
//! is surfaced as `StoreError::DuplicateTitle`.
//!
//! The table is created on the first operation that reaches the database,
//! so a datastore that was down at startup gets its schema once it is back.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tokio::sync::OnceCell;

use crate::model::{NewTodo, Todo, TodoChanges, TodoList};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL UNIQUE,
    description TEXT,
    priority    INTEGER NOT NULL DEFAULT 0,
    isDone      INTEGER NOT NULL DEFAULT 0,
    createdAt   TEXT    NOT NULL,
    updatedAt   TEXT    NOT NULL
)
"#;

/// Errors raised by `TodoStore`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another todo already uses this title.
    #[error("title must be unique")]
    DuplicateTitle,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateTitle,
            _ => StoreError::Sqlx(error),
        }
    }
}

/// Handle to the `todos` table. Cheap to clone.
#[derive(Clone, Debug)]
pub struct TodoStore {
    pool: SqlitePool,
    schema: Arc<OnceCell<()>>,
}

impl TodoStore {
    fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        }
    }

    /// Build a pool for `url` without opening a connection yet. The database
    /// file is created on first use if it does not exist.
    pub fn connect_lazy(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(options);
        Ok(Self::new(pool))
    }

    /// Like `connect_lazy`, but fails unless a connection can be opened now.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let store = Self::connect_lazy(url)?;
        store.ping().await?;
        Ok(store)
    }

    /// A private in-memory database with the table already created.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn create_table(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Runs `create_table` once per store. A failed attempt is retried on the
    /// next call.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.schema.get_or_try_init(|| self.create_table()).await?;
        Ok(())
    }

    /// Destroys every stored todo. Only used to reset the schema by hand.
    pub async fn drop_table(&self) -> Result<(), StoreError> {
        sqlx::query("DROP TABLE IF EXISTS todos")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_all(&self) -> Result<TodoList, StoreError> {
        self.ensure_schema().await?;
        let rows = sqlx::query_as::<_, Todo>("SELECT * FROM todos ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(TodoList::from(rows))
    }

    pub async fn create(&self, new: NewTodo) -> Result<Todo, StoreError> {
        self.ensure_schema().await?;
        let now = Utc::now();
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (title, description, priority, isDone, createdAt, updatedAt)
            VALUES (?, ?, ?, 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.priority.unwrap_or(0))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(todo)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        self.ensure_schema().await?;
        let todo = sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    /// First todo whose title matches exactly (case-sensitive).
    pub async fn find_by_title(&self, title: &str) -> Result<Option<Todo>, StoreError> {
        self.ensure_schema().await?;
        let todo = sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE title = ? LIMIT 1")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    /// Returns the number of rows changed, 0 when `id` does not exist.
    pub async fn update_by_id(&self, id: i64, changes: TodoChanges) -> Result<u64, StoreError> {
        self.ensure_schema().await?;
        let (set_description, description) = match changes.description {
            Some(description) => (true, description),
            None => (false, None),
        };
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = COALESCE(?, title),
                description = CASE WHEN ? THEN ? ELSE description END,
                updatedAt = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.title)
        .bind(set_description)
        .bind(&description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Returns the number of rows removed, 0 when `id` does not exist.
    pub async fn delete_by_id(&self, id: i64) -> Result<u64, StoreError> {
        self.ensure_schema().await?;
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
