//! Todo repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `todos` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Each statement is atomic on its own; there is no cross-call transaction,
//!   so concurrent updates of one id resolve as last-write-wins.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::todo::{Priority, Todo, TodoId, TodoPatch, TodoValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TODO_SELECT_SQL: &str = "SELECT
    id,
    text,
    completed,
    priority,
    created_at,
    updated_at
FROM todos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every todo backing store.
#[derive(Debug)]
pub enum RepoError {
    Validation(TodoValidationError),
    Db(DbError),
    NotFound(TodoId),
    InvalidData(String),
    /// Failure of a non-SQL backing store (for example a snapshot file).
    Storage(std::io::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value)
    }
}

/// Repository interface for todo persistence.
pub trait TodoRepository {
    /// All todos, most recently created first.
    fn list_todos(&self) -> RepoResult<Vec<Todo>>;
    fn get_todo(&self, id: &str) -> RepoResult<Option<Todo>>;
    fn create_todo(&self, todo: &Todo) -> RepoResult<()>;
    /// Applies only the supplied patch fields plus `updated_at`.
    fn update_todo(&self, id: &str, patch: &TodoPatch, updated_at: i64) -> RepoResult<Todo>;
    fn delete_todo(&self, id: &str) -> RepoResult<()>;
    /// Returns the number of removed rows.
    fn clear_completed(&self) -> RepoResult<usize>;
    /// Returns the number of removed rows.
    fn clear_all(&self) -> RepoResult<usize>;
    /// Cheap reachability probe of the backing store.
    fn ping(&self) -> RepoResult<()>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn list_todos(&self) -> RepoResult<Vec<Todo>> {
        // rowid breaks ties between todos created within the same millisecond.
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut todos = Vec::new();

        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }

        Ok(todos)
    }

    fn get_todo(&self, id: &str) -> RepoResult<Option<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(row)?));
        }

        Ok(None)
    }

    fn create_todo(&self, todo: &Todo) -> RepoResult<()> {
        todo.validate()?;

        self.conn.execute(
            "INSERT INTO todos (
                id,
                text,
                completed,
                priority,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                todo.id.as_str(),
                todo.text.as_str(),
                todo.completed,
                todo.priority.as_str(),
                todo.created_at,
                todo.updated_at,
            ],
        )?;

        Ok(())
    }

    fn update_todo(&self, id: &str, patch: &TodoPatch, updated_at: i64) -> RepoResult<Todo> {
        let patch = patch.normalized()?;
        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(text) = patch.text {
            assignments.push("text = ?");
            bind_values.push(Value::Text(text));
        }
        if let Some(completed) = patch.completed {
            assignments.push("completed = ?");
            bind_values.push(Value::Integer(i64::from(completed)));
        }
        if let Some(priority) = patch.priority {
            assignments.push("priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }
        assignments.push("updated_at = MAX(updated_at, ?)");
        bind_values.push(Value::Integer(updated_at));
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!("UPDATE todos SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        self.get_todo(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    fn delete_todo(&self, id: &str) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM todos WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn clear_completed(&self) -> RepoResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM todos WHERE completed = 1;", [])?)
    }

    fn clear_all(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM todos;", [])?)
    }

    fn ping(&self) -> RepoResult<()> {
        self.conn
            .query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in todos.priority"
        ))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in todos.completed"
            )));
        }
    };

    Ok(Todo {
        id: row.get("id")?,
        text: row.get("text")?,
        completed,
        priority,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
