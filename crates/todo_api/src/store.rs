//! Lazily bootstrapped backing store for the API service.
//!
//! # Responsibility
//! - Own the single SQLite connection behind a mutex.
//! - Ensure the schema exists before the first data-touching request.
//! - Probe reachability for the health route without failing.
//!
//! # Invariants
//! - A failed open is never cached; the next request retries bootstrap.
//! - Each request runs its statements while holding the lock, so every
//!   single statement is atomic; there is no cross-request transaction.

use crate::config::DatabaseLocation;
use log::{info, warn};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard, PoisonError};
use todo_core::db::{open_db, open_db_in_memory, DbResult};
use todo_core::{RepoResult, SqliteTodoRepository, TodoRepository, TodoService};

/// Reachability report for `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHealth {
    pub reachable: bool,
    pub error: Option<String>,
}

pub struct Store {
    location: DatabaseLocation,
    conn: Mutex<Option<Connection>>,
}

impl Store {
    /// Creates a store without touching the database.
    pub fn new(location: DatabaseLocation) -> Self {
        Self {
            location,
            conn: Mutex::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(DatabaseLocation::Memory)
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Eager startup bootstrap. Failure is logged and left for the next
    /// request to retry.
    pub fn bootstrap(&self) -> bool {
        let mut guard = self.lock();
        match ensure_connection(&mut guard, &self.location) {
            Ok(_) => {
                info!(
                    "event=schema_bootstrap module=store status=ok location={}",
                    self.location.describe()
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=schema_bootstrap module=store status=deferred location={} error={}",
                    self.location.describe(),
                    err
                );
                false
            }
        }
    }

    /// Runs `f` against a service bound to the bootstrapped connection.
    pub fn with_service<T>(
        &self,
        f: impl FnOnce(&TodoService<SqliteTodoRepository<'_>>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut guard = self.lock();
        let conn = ensure_connection(&mut guard, &self.location)?;
        let service = TodoService::new(SqliteTodoRepository::new(conn));
        f(&service)
    }

    /// Best-effort connectivity probe; never fails.
    pub fn health(&self) -> StoreHealth {
        let result = self.with_service(|service| service.repository().ping());
        match result {
            Ok(()) => StoreHealth {
                reachable: true,
                error: None,
            },
            Err(err) => {
                warn!("event=health_probe module=store status=error error={err}");
                StoreHealth {
                    reachable: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_connection<'a>(
    slot: &'a mut Option<Connection>,
    location: &DatabaseLocation,
) -> DbResult<&'a Connection> {
    let conn = match slot.take() {
        Some(conn) => conn,
        None => match location {
            DatabaseLocation::Memory => open_db_in_memory()?,
            DatabaseLocation::File(path) => open_db(path)?,
        },
    };
    let conn: &'a Connection = slot.insert(conn);
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::config::DatabaseLocation;
    use todo_core::Priority;

    #[test]
    fn requests_retry_bootstrap_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing_parent = dir.path().join("not-yet").join("todo.sqlite3");
        let store = Store::new(DatabaseLocation::File(missing_parent.clone()));

        assert!(!store.bootstrap());
        let health = store.health();
        assert!(!health.reachable);
        assert!(health.error.is_some());

        std::fs::create_dir_all(missing_parent.parent().unwrap()).unwrap();
        let created = store
            .with_service(|service| service.add("later", Priority::Low))
            .unwrap();
        assert_eq!(created.text, "later");
        assert!(store.health().reachable);
    }

    #[test]
    fn in_memory_store_keeps_rows_between_requests() {
        let store = Store::in_memory();
        assert!(store.bootstrap());

        store
            .with_service(|service| service.add("one", Priority::Medium))
            .unwrap();
        let listed = store.with_service(|service| service.list()).unwrap();
        assert_eq!(listed.len(), 1);
    }
}
