//! Todo domain model.
//!
//! # Responsibility
//! - Define the canonical record and its wire shape.
//! - Normalize create/patch input before it reaches persistence.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `updated_at` is stamped on every mutation and is `>= created_at`.
//! - Wire fields are camelCase regardless of storage column naming.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque identifier of a todo.
///
/// Server-generated ids are UUID v4 strings, but callers must not rely on
/// the format: locally stored snapshots may carry ids of any shape.
pub type TodoId = String;

/// Importance level of a todo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Parses the canonical lowercase name. Unknown names return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim().to_ascii_lowercase().as_str())
            .ok_or_else(|| format!("unknown priority `{value}`; expected low|medium|high"))
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Out-of-domain values decode as `medium`.
    #[serde(default, deserialize_with = "deserialize_priority_or_default")]
    pub priority: Priority,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Todo {
    /// Builds a fresh record from validated input with a generated id.
    ///
    /// # Invariants
    /// - `completed` starts as `false`.
    /// - `created_at == updated_at == now_ms`.
    pub fn create(input: NewTodo, now_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), input, now_ms)
    }

    /// Builds a fresh record with a caller-provided id.
    pub fn with_id(id: impl Into<TodoId>, input: NewTodo, now_ms: i64) -> Self {
        Self {
            id: id.into(),
            text: input.text,
            completed: false,
            priority: input.priority,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.text.trim().is_empty() {
            return Err(TodoValidationError::EmptyText);
        }
        Ok(())
    }

    /// Applies supplied patch fields and stamps `updated_at`.
    ///
    /// The stamp never moves backwards, so a skewed clock cannot make
    /// `updated_at` earlier than a previous mutation.
    pub fn apply_patch(&mut self, patch: &TodoPatch, now_ms: i64) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        self.updated_at = now_ms.max(self.updated_at);
    }
}

/// Validated input for creating a todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub text: String,
    pub priority: Priority,
}

impl NewTodo {
    /// Trims `text` and rejects it when nothing remains.
    pub fn new(text: &str, priority: Priority) -> Result<Self, TodoValidationError> {
        Ok(Self {
            text: normalize_text(text)?,
            priority,
        })
    }
}

/// Partial update. A `None` field is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Out-of-domain values decode as "not supplied".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_priority_lenient"
    )]
    pub priority: Option<Priority>,
}

impl TodoPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none() && self.priority.is_none()
    }

    /// Returns a copy with supplied text trimmed.
    ///
    /// # Errors
    /// - `EmptyText` when a supplied text is blank after trimming.
    pub fn normalized(&self) -> Result<Self, TodoValidationError> {
        let text = match &self.text {
            Some(text) => Some(normalize_text(text)?),
            None => None,
        };
        Ok(Self {
            text,
            completed: self.completed,
            priority: self.priority,
        })
    }
}

/// Input validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    EmptyText,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "text is required"),
        }
    }
}

impl Error for TodoValidationError {}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

fn normalize_text(text: &str) -> Result<String, TodoValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TodoValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Decodes any JSON value as an optional priority; non-matching values
/// (unknown names, numbers, objects) become `None`.
pub fn deserialize_priority_lenient<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(Priority::parse))
}

fn deserialize_priority_or_default<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_priority_lenient(deserializer)?.unwrap_or_default())
}
