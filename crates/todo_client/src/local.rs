//! Local snapshot repository.
//!
//! # Responsibility
//! - Persist the whole todo list as one JSON blob under a fixed storage key.
//! - Implement the shared `TodoRepository` contract without any network.
//!
//! # Invariants
//! - Every operation reads the full snapshot, mutates in memory and writes
//!   the full snapshot back; nothing is written when nothing changed.
//! - Safe only under a single writer (one process on the storage file).
//! - Reads never fail: a missing or corrupt snapshot is an empty list,
//!   out-of-domain priorities read as medium, fractional timestamps are
//!   truncated to whole milliseconds.
//! - Records that still cannot be read are hidden from callers but written
//!   back untouched; only `clear_all` (or `clear_completed` for records
//!   flagged `completed: true`) removes them.

use crate::storage::{LocalStorage, TODO_ITEMS_KEY};
use log::warn;
use serde_json::Value;
use todo_core::{RepoError, RepoResult, Todo, TodoPatch, TodoRepository};

const TIMESTAMP_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

pub struct LocalTodoRepository {
    storage: LocalStorage,
}

/// One stored record, decoded when possible.
enum Entry {
    Todo(Todo),
    Unreadable(Value),
}

impl Entry {
    fn decode(mut item: Value) -> Self {
        if let Value::Object(fields) = &mut item {
            for key in TIMESTAMP_FIELDS {
                let whole = fields
                    .get(key)
                    .filter(|value| !value.is_i64())
                    .and_then(Value::as_f64)
                    .filter(|ms| ms.is_finite());
                if let Some(ms) = whole {
                    fields.insert(key.to_string(), Value::from(ms.trunc() as i64));
                }
            }
        }

        match serde_json::from_value::<Todo>(item.clone()) {
            Ok(todo) if todo.validate().is_ok() => Self::Todo(todo),
            Ok(_) | Err(_) => Self::Unreadable(item),
        }
    }

    fn todo(&self) -> Option<&Todo> {
        match self {
            Self::Todo(todo) => Some(todo),
            Self::Unreadable(_) => None,
        }
    }

    fn is_completed(&self) -> bool {
        match self {
            Self::Todo(todo) => todo.completed,
            Self::Unreadable(value) => value.get("completed") == Some(&Value::Bool(true)),
        }
    }
}

impl LocalTodoRepository {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    fn read_snapshot(&self) -> Vec<Entry> {
        let raw = match self.storage.get_item(TODO_ITEMS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("event=snapshot_read module=local status=error error={err}");
                return Vec::new();
            }
        };

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) | Err(_) => {
                warn!("event=snapshot_read module=local status=corrupt");
                return Vec::new();
            }
        };

        let entries: Vec<Entry> = items.into_iter().map(Entry::decode).collect();
        let unreadable = entries.iter().filter(|entry| entry.todo().is_none()).count();
        if unreadable > 0 {
            warn!("event=snapshot_read module=local status=partial unreadable={unreadable}");
        }
        entries
    }

    fn read_todos(&self) -> Vec<Todo> {
        self.read_snapshot()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Todo(todo) => Some(todo),
                Entry::Unreadable(_) => None,
            })
            .collect()
    }

    fn write_snapshot(&self, entries: &[Entry]) -> RepoResult<()> {
        let items = entries
            .iter()
            .map(|entry| match entry {
                Entry::Todo(todo) => serde_json::to_value(todo),
                Entry::Unreadable(value) => Ok(value.clone()),
            })
            .collect::<Result<Vec<Value>, _>>()
            .map_err(|err| RepoError::InvalidData(format!("snapshot encode failed: {err}")))?;
        self.storage
            .set_item(TODO_ITEMS_KEY, &Value::Array(items).to_string())?;
        Ok(())
    }
}

impl TodoRepository for LocalTodoRepository {
    fn list_todos(&self) -> RepoResult<Vec<Todo>> {
        Ok(self.read_todos())
    }

    fn get_todo(&self, id: &str) -> RepoResult<Option<Todo>> {
        Ok(self.read_todos().into_iter().find(|todo| todo.id == id))
    }

    fn create_todo(&self, todo: &Todo) -> RepoResult<()> {
        todo.validate()?;

        let mut entries = self.read_snapshot();
        entries.insert(0, Entry::Todo(todo.clone()));
        self.write_snapshot(&entries)
    }

    fn update_todo(&self, id: &str, patch: &TodoPatch, updated_at: i64) -> RepoResult<Todo> {
        let patch = patch.normalized()?;
        let mut entries = self.read_snapshot();
        let todo = entries
            .iter_mut()
            .find_map(|entry| match entry {
                Entry::Todo(todo) if todo.id == id => Some(todo),
                _ => None,
            })
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;

        todo.apply_patch(&patch, updated_at);
        let updated = todo.clone();
        self.write_snapshot(&entries)?;
        Ok(updated)
    }

    fn delete_todo(&self, id: &str) -> RepoResult<()> {
        let mut entries = self.read_snapshot();
        let before = entries.len();
        entries.retain(|entry| entry.todo().map_or(true, |todo| todo.id != id));
        if entries.len() == before {
            return Err(RepoError::NotFound(id.to_string()));
        }
        self.write_snapshot(&entries)
    }

    fn clear_completed(&self) -> RepoResult<usize> {
        let mut entries = self.read_snapshot();
        let before = entries.len();
        entries.retain(|entry| !entry.is_completed());
        let removed = before - entries.len();
        if removed > 0 {
            self.write_snapshot(&entries)?;
        }
        Ok(removed)
    }

    fn clear_all(&self) -> RepoResult<usize> {
        let removed = self.read_snapshot().len();
        self.write_snapshot(&[])?;
        Ok(removed)
    }

    fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LocalTodoRepository;
    use crate::storage::{LocalStorage, TODO_ITEMS_KEY};
    use serde_json::json;
    use todo_core::{Priority, RepoError, TodoPatch, TodoRepository, TodoService};

    fn service(dir: &tempfile::TempDir) -> TodoService<LocalTodoRepository> {
        TodoService::new(LocalTodoRepository::new(LocalStorage::in_dir(dir.path())))
    }

    #[test]
    fn add_puts_newest_first_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);

        let first = service.add("first", Priority::Low).unwrap();
        let second = service.add(" second ", Priority::High).unwrap();
        assert_eq!(second.text, "second");
        assert_eq!(second.created_at, second.updated_at);

        let reopened = self::service(&dir);
        let listed = reopened.list().unwrap();
        assert_eq!(listed, vec![second, first]);
    }

    #[test]
    fn corrupt_or_foreign_snapshot_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let repo = LocalTodoRepository::new(storage.clone());

        storage.set_item(TODO_ITEMS_KEY, "{broken").unwrap();
        assert!(repo.list_todos().unwrap().is_empty());

        storage.set_item(TODO_ITEMS_KEY, r#"{"not":"a list"}"#).unwrap();
        assert!(repo.list_todos().unwrap().is_empty());
    }

    #[test]
    fn snapshot_records_are_coerced_or_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let snapshot = json!([
            { "id": "a", "text": "ok", "completed": false, "priority": "weird", "createdAt": 2, "updatedAt": 2 },
            { "id": "b", "completed": true },
            { "id": "c", "text": "   ", "createdAt": 1, "updatedAt": 1 },
            { "id": "d", "text": "kept", "completed": true, "priority": "low", "createdAt": 1, "updatedAt": 3 }
        ]);
        storage
            .set_item(TODO_ITEMS_KEY, &snapshot.to_string())
            .unwrap();

        let listed = LocalTodoRepository::new(storage).list_todos().unwrap();
        let summary: Vec<_> = listed
            .iter()
            .map(|todo| (todo.id.as_str(), todo.priority))
            .collect();
        assert_eq!(summary, [("a", Priority::Medium), ("d", Priority::Low)]);
    }

    #[test]
    fn unreadable_records_survive_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let snapshot = json!([
            { "id": "legacy", "text": "old", "completed": false, "priority": "high", "createdAt": 1.5e12, "updatedAt": 1500000000000.7 },
            { "id": "partial", "completed": false }
        ]);
        storage
            .set_item(TODO_ITEMS_KEY, &snapshot.to_string())
            .unwrap();
        let service = TodoService::new(LocalTodoRepository::new(storage.clone()));

        let listed = service.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "legacy");
        assert_eq!(listed[0].created_at, 1_500_000_000_000);
        assert_eq!(listed[0].updated_at, 1_500_000_000_000);

        let added = service.add("new", Priority::Low).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&storage.get_item(TODO_ITEMS_KEY).unwrap().unwrap()).unwrap();
        let ids: Vec<&str> = raw
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, [added.id.as_str(), "legacy", "partial"]);
        assert_eq!(raw[2], json!({ "id": "partial", "completed": false }));

        assert_eq!(service.clear_completed().unwrap(), 0);
        assert_eq!(service.clear_all().unwrap(), 3);
        assert_eq!(storage.get_item(TODO_ITEMS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);

        let err = service
            .update("missing", &TodoPatch::completed(true))
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn update_applies_patch_and_keeps_identity() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);
        let created = service.add("draft", Priority::Medium).unwrap();

        let updated = service
            .update(&created.id, &TodoPatch::text("  done "))
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.text, "done");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(service.list().unwrap(), vec![updated]);

        let err = service
            .update(&created.id, &TodoPatch::text(" "))
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn clear_completed_removes_only_completed() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);
        let mut expected_active = Vec::new();
        for index in 0..6 {
            let todo = service.add(&format!("t{index}"), Priority::Low).unwrap();
            if index % 3 == 0 {
                service.update(&todo.id, &TodoPatch::completed(true)).unwrap();
            } else {
                expected_active.push(todo.id);
            }
        }

        assert_eq!(service.clear_completed().unwrap(), 2);
        let mut remaining: Vec<_> = service
            .list()
            .unwrap()
            .into_iter()
            .map(|todo| {
                assert!(!todo.completed);
                todo.id
            })
            .collect();
        remaining.sort();
        expected_active.sort();
        assert_eq!(remaining, expected_active);
    }
}
