//! Uniform repository over the local snapshot and the remote API.
//!
//! # Responsibility
//! - Pick the backing store once at startup from stored preferences.
//! - Expose `list/add/update/delete/clear_completed` with one error model.
//!
//! # Invariants
//! - The variant is chosen once; calls never re-read the preference.
//! - `NotFound` means the same thing for both variants, except that a local
//!   `delete` of a missing id is a no-op.

use crate::error::{ClientError, ClientResult};
use crate::local::LocalTodoRepository;
use crate::prefs::{DataSource, Preferences};
use crate::remote::RemoteTodoRepository;
use crate::storage::LocalStorage;
use log::{info, warn};
use std::time::Duration;
use todo_core::{Priority, RepoError, Todo, TodoPatch, TodoService};

/// Startup probe budget for auto-detection.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(800);

pub enum Repository {
    Local(TodoService<LocalTodoRepository>),
    Remote(RemoteTodoRepository),
}

impl Repository {
    pub fn local(storage: LocalStorage) -> Self {
        Self::Local(TodoService::new(LocalTodoRepository::new(storage)))
    }

    pub fn remote(base_url: &str) -> ClientResult<Self> {
        Ok(Self::Remote(RemoteTodoRepository::new(base_url)?))
    }

    /// Resolves the stored preference (probing when unset or `auto`) and
    /// builds the matching variant.
    pub async fn resolve(storage: &LocalStorage) -> ClientResult<Self> {
        Self::resolve_with_timeout(storage, PROBE_TIMEOUT).await
    }

    pub async fn resolve_with_timeout(
        storage: &LocalStorage,
        probe_timeout: Duration,
    ) -> ClientResult<Self> {
        match detect_data_source(storage, probe_timeout).await {
            DataSource::Api => {
                let base_url = Preferences::new(storage).api_base();
                Self::remote(&base_url)
            }
            DataSource::Local | DataSource::Auto => Ok(Self::local(storage.clone())),
        }
    }

    pub fn mode(&self) -> DataSource {
        match self {
            Self::Local(_) => DataSource::Local,
            Self::Remote(_) => DataSource::Api,
        }
    }

    /// Most recently created first. The local variant never fails.
    pub async fn list(&self) -> ClientResult<Vec<Todo>> {
        match self {
            Self::Local(service) => Ok(service.list()?),
            Self::Remote(remote) => remote.list().await,
        }
    }

    pub async fn add(&self, text: &str, priority: Priority) -> ClientResult<Todo> {
        match self {
            Self::Local(service) => Ok(service.add(text, priority)?),
            Self::Remote(remote) => remote.add(text, priority).await,
        }
    }

    pub async fn update(&self, id: &str, patch: &TodoPatch) -> ClientResult<Todo> {
        match self {
            Self::Local(service) => Ok(service.update(id, patch)?),
            Self::Remote(remote) => remote.update(id, patch).await,
        }
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        match self {
            Self::Local(service) => match service.delete(id) {
                Ok(()) | Err(RepoError::NotFound(_)) => Ok(()),
                Err(err) => Err(err.into()),
            },
            Self::Remote(remote) => remote.delete(id).await,
        }
    }

    pub async fn clear_completed(&self) -> ClientResult<()> {
        match self {
            Self::Local(service) => {
                service.clear_completed()?;
                Ok(())
            }
            Self::Remote(remote) => remote.clear_completed().await,
        }
    }
}

/// Returns the data source to use, probing the API when the stored
/// preference is missing or `auto`.
///
/// A successful probe against a server whose store is reachable pins `api`
/// and persists the base URL; anything else (error, timeout, store down)
/// pins `local`. The pinned choice is sticky until the preference is cleared.
pub async fn detect_data_source(storage: &LocalStorage, timeout: Duration) -> DataSource {
    let prefs = Preferences::new(storage);
    match prefs.data_source() {
        Some(DataSource::Local) => return DataSource::Local,
        Some(DataSource::Api) => return DataSource::Api,
        Some(DataSource::Auto) | None => {}
    }

    let base_url = prefs.api_base();
    let detected = match probe(&base_url, timeout).await {
        Ok(()) => DataSource::Api,
        Err(reason) => {
            info!("event=source_detect module=repository status=fallback reason={reason}");
            DataSource::Local
        }
    };

    let persisted = match detected {
        DataSource::Api => prefs
            .set_data_source(DataSource::Api)
            .and_then(|()| prefs.set_api_base(&base_url)),
        _ => prefs.set_data_source(DataSource::Local),
    };
    if let Err(err) = persisted {
        warn!("event=source_detect module=repository status=persist_failed error={err}");
    }

    info!(
        "event=source_detect module=repository status=ok source={}",
        detected
    );
    detected
}

async fn probe(base_url: &str, timeout: Duration) -> Result<(), String> {
    let remote =
        RemoteTodoRepository::with_timeout(base_url, timeout).map_err(|err| err.to_string())?;

    match tokio::time::timeout(timeout, remote.health()).await {
        Ok(Ok(report)) if report.store_reachable() => Ok(()),
        Ok(Ok(_)) => Err("store_unreachable".to_string()),
        Ok(Err(ClientError::Transport(_))) => Err("unreachable".to_string()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err("timeout".to_string()),
    }
}
