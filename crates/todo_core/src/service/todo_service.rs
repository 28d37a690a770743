//! Todo use-case service.
//!
//! # Responsibility
//! - Provide the five list operations plus bulk clear for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::todo::{now_epoch_ms, NewTodo, Priority, Todo, TodoPatch};
use crate::repo::todo_repo::{RepoResult, TodoRepository};

/// Use-case service wrapper for todo operations.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Lists all todos, most recently created first.
    pub fn list(&self) -> RepoResult<Vec<Todo>> {
        self.repo.list_todos()
    }

    /// Creates a todo from raw user input.
    ///
    /// # Contract
    /// - Text is trimmed; blank text fails with `RepoError::Validation`.
    /// - Id is generated; `created_at == updated_at == now`.
    /// - `completed` starts as `false`.
    pub fn add(&self, text: &str, priority: Priority) -> RepoResult<Todo> {
        let input = NewTodo::new(text, priority)?;
        let todo = Todo::create(input, now_epoch_ms());
        self.repo.create_todo(&todo)?;
        Ok(todo)
    }

    /// Applies a partial update and returns the stored record.
    ///
    /// Returns repository-level not-found or validation errors unchanged.
    pub fn update(&self, id: &str, patch: &TodoPatch) -> RepoResult<Todo> {
        let patch = patch.normalized()?;
        self.repo.update_todo(id, &patch, now_epoch_ms())
    }

    pub fn delete(&self, id: &str) -> RepoResult<()> {
        self.repo.delete_todo(id)
    }

    pub fn clear_completed(&self) -> RepoResult<usize> {
        self.repo.clear_completed()
    }

    pub fn clear_all(&self) -> RepoResult<usize> {
        self.repo.clear_all()
    }
}
