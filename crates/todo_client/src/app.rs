//! Controller over a resolved [`Repository`].
//!
//! Keeps the last fetched list and one user-facing error line. Every
//! successful mutation re-fetches the full list; a failure records its
//! category message and leaves the previous list untouched.

use crate::error::{ClientError, ClientResult};
use crate::repository::Repository;
use log::warn;
use todo_core::{Priority, Todo, TodoPatch};

pub const LOAD_FAILED: &str = "Failed to load todos.";
pub const ADD_FAILED: &str = "Failed to add todo.";
pub const UPDATE_FAILED: &str = "Failed to update todo.";
pub const PRIORITY_FAILED: &str = "Failed to change priority.";
pub const SAVE_FAILED: &str = "Failed to save changes.";
pub const DELETE_FAILED: &str = "Failed to delete todo.";
pub const CLEAR_FAILED: &str = "Failed to clear completed.";

pub struct TodoApp {
    repo: Repository,
    todos: Vec<Todo>,
    error: Option<&'static str>,
}

impl TodoApp {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            todos: Vec::new(),
            error: None,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub async fn load(&mut self) -> ClientResult<()> {
        self.refresh(LOAD_FAILED).await
    }

    /// Blank text is ignored and yields `Ok(None)`.
    pub async fn add(&mut self, text: &str, priority: Priority) -> ClientResult<Option<Todo>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let created = match self.repo.add(text, priority).await {
            Ok(todo) => todo,
            Err(err) => return Err(self.fail(ADD_FAILED, err)),
        };
        self.refresh(ADD_FAILED).await?;
        Ok(Some(created))
    }

    /// Flips `completed` relative to the last loaded state.
    pub async fn toggle(&mut self, id: &str) -> ClientResult<Todo> {
        let completed = self
            .todos
            .iter()
            .find(|todo| todo.id == id)
            .map(|todo| !todo.completed);
        let Some(completed) = completed else {
            return Err(self.fail(UPDATE_FAILED, ClientError::NotFound(id.to_string())));
        };
        self.set_completed(id, completed).await
    }

    pub async fn set_completed(&mut self, id: &str, completed: bool) -> ClientResult<Todo> {
        self.patch(id, TodoPatch::completed(completed), UPDATE_FAILED)
            .await
    }

    pub async fn set_priority(&mut self, id: &str, priority: Priority) -> ClientResult<Todo> {
        self.patch(id, TodoPatch::priority(priority), PRIORITY_FAILED)
            .await
    }

    /// An empty (after trim) edit cancels and yields `Ok(None)`.
    pub async fn edit_text(&mut self, id: &str, text: &str) -> ClientResult<Option<Todo>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.patch(id, TodoPatch::text(text), SAVE_FAILED)
            .await
            .map(Some)
    }

    pub async fn remove(&mut self, id: &str) -> ClientResult<()> {
        if let Err(err) = self.repo.delete(id).await {
            return Err(self.fail(DELETE_FAILED, err));
        }
        self.refresh(DELETE_FAILED).await
    }

    pub async fn clear_completed(&mut self) -> ClientResult<()> {
        if let Err(err) = self.repo.clear_completed().await {
            return Err(self.fail(CLEAR_FAILED, err));
        }
        self.refresh(CLEAR_FAILED).await
    }

    async fn patch(
        &mut self,
        id: &str,
        patch: TodoPatch,
        message: &'static str,
    ) -> ClientResult<Todo> {
        let updated = match self.repo.update(id, &patch).await {
            Ok(todo) => todo,
            Err(err) => return Err(self.fail(message, err)),
        };
        self.refresh(message).await?;
        Ok(updated)
    }

    /// Re-fetches the list; a failure is reported under `message`, the
    /// category of the action that triggered the refresh.
    async fn refresh(&mut self, message: &'static str) -> ClientResult<()> {
        match self.repo.list().await {
            Ok(todos) => {
                self.todos = todos;
                self.error = None;
                Ok(())
            }
            Err(err) => Err(self.fail(message, err)),
        }
    }

    fn fail(&mut self, message: &'static str, err: ClientError) -> ClientError {
        warn!("event=app_action module=app status=error message={message:?} error={err}");
        self.error = Some(message);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::{TodoApp, UPDATE_FAILED};
    use crate::error::ClientError;
    use crate::repository::Repository;
    use crate::storage::LocalStorage;
    use todo_core::Priority;

    fn app_in(dir: &tempfile::TempDir) -> TodoApp {
        TodoApp::new(Repository::local(LocalStorage::in_dir(dir.path())))
    }

    #[tokio::test]
    async fn mutations_refetch_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.load().await.unwrap();
        assert!(app.todos().is_empty());

        let first = app.add("first", Priority::Low).await.unwrap().unwrap();
        app.add("second", Priority::High).await.unwrap();
        let texts: Vec<&str> = app.todos().iter().map(|todo| todo.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);

        let toggled = app.toggle(&first.id).await.unwrap();
        assert!(toggled.completed);
        assert!(app.todos().iter().any(|todo| todo.id == first.id && todo.completed));

        app.set_priority(&first.id, Priority::High).await.unwrap();
        app.edit_text(&first.id, "  renamed ").await.unwrap();
        let stored = app.todos().iter().find(|todo| todo.id == first.id).unwrap();
        assert_eq!(stored.text, "renamed");
        assert_eq!(stored.priority, Priority::High);

        app.clear_completed().await.unwrap();
        assert_eq!(app.todos().len(), 1);
        assert_eq!(app.error(), None);
    }

    #[tokio::test]
    async fn blank_inputs_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        assert!(app.add("   ", Priority::Medium).await.unwrap().is_none());
        let todo = app.add("keep", Priority::Medium).await.unwrap().unwrap();
        assert!(app.edit_text(&todo.id, "  ").await.unwrap().is_none());

        assert_eq!(app.todos().len(), 1);
        assert_eq!(app.todos()[0].text, "keep");
    }

    #[tokio::test]
    async fn local_remove_of_missing_id_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.remove("missing").await.unwrap();
        assert_eq!(app.error(), None);
    }

    #[tokio::test]
    async fn failed_update_keeps_stale_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.add("one", Priority::Medium).await.unwrap();

        let err = app.set_completed("missing", true).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(id) if id == "missing"));
        assert_eq!(app.error(), Some(UPDATE_FAILED));
        assert_eq!(app.todos().len(), 1);

        app.load().await.unwrap();
        assert_eq!(app.error(), None);
    }
}
