//! HTTP-backed repository talking to the API service.
//!
//! # Responsibility
//! - Map the five list operations onto `/api/todos` requests.
//! - Translate HTTP status codes into the shared `ClientError` outcomes.
//!
//! # Invariants
//! - Ids are sent as a single encoded path segment.
//! - 400 maps to `Validation`, 404 to `NotFound`; anything else non-2xx is
//!   `Http` with the server's diagnostic message.

use crate::error::{ClientError, ClientResult};
use log::debug;
use reqwest::{Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use todo_core::{Priority, Todo, TodoPatch};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Payload of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub ok: bool,
    /// Missing on servers that do not probe their store.
    #[serde(default)]
    pub db: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn store_reachable(&self) -> bool {
        self.ok && self.db.unwrap_or(true)
    }
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    text: &'a str,
    priority: Priority,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct RemoteTodoRepository {
    http: reqwest::Client,
    base_url: Url,
}

impl RemoteTodoRepository {
    /// Builds a client for `base_url` (scheme + host, e.g. `http://localhost:4000`).
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ClientError::InvalidBaseUrl(base_url.to_string()))?;

        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub async fn list(&self) -> ClientResult<Vec<Todo>> {
        let resp = self.http.get(self.endpoint(&["todos"])?).send().await?;
        let resp = check_status(resp, None).await?;
        Ok(resp.json().await?)
    }

    pub async fn add(&self, text: &str, priority: Priority) -> ClientResult<Todo> {
        let resp = self
            .http
            .post(self.endpoint(&["todos"])?)
            .json(&CreateRequest { text, priority })
            .send()
            .await?;
        let resp = check_status(resp, None).await?;
        Ok(resp.json().await?)
    }

    pub async fn update(&self, id: &str, patch: &TodoPatch) -> ClientResult<Todo> {
        let resp = self
            .http
            .patch(self.endpoint(&["todos", id])?)
            .json(patch)
            .send()
            .await?;
        let resp = check_status(resp, Some(id)).await?;
        Ok(resp.json().await?)
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        let resp = self
            .http
            .delete(self.endpoint(&["todos", id])?)
            .send()
            .await?;
        check_status(resp, Some(id)).await?;
        Ok(())
    }

    pub async fn clear_completed(&self) -> ClientResult<()> {
        let mut url = self.endpoint(&["todos"])?;
        url.query_pairs_mut().append_pair("only", "completed");
        let resp = self.http.delete(url).send().await?;
        check_status(resp, None).await?;
        Ok(())
    }

    pub async fn health(&self) -> ClientResult<HealthReport> {
        let resp = self.http.get(self.endpoint(&["health"])?).send().await?;
        let resp = check_status(resp, None).await?;
        Ok(resp.json().await?)
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }
}

async fn check_status(resp: Response, id: Option<&str>) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|parsed| parsed.error)
        .unwrap_or(body);
    debug!(
        "event=api_call module=remote status=error http_status={}",
        status.as_u16()
    );

    Err(match status {
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(id.map_or(message, str::to_string)),
        _ => ClientError::Http {
            status: status.as_u16(),
            message,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::{HealthReport, RemoteTodoRepository};

    #[test]
    fn endpoints_are_built_under_api_prefix() {
        let repo = RemoteTodoRepository::new("http://localhost:4000/").unwrap();
        assert_eq!(repo.base_url(), "http://localhost:4000");
        assert_eq!(
            repo.endpoint(&["todos"]).unwrap().as_str(),
            "http://localhost:4000/api/todos"
        );
        assert_eq!(
            repo.endpoint(&["todos", "a b/c"]).unwrap().as_str(),
            "http://localhost:4000/api/todos/a%20b%2Fc"
        );
    }

    #[test]
    fn base_url_with_path_prefix_is_kept() {
        let repo = RemoteTodoRepository::new("http://proxy.test/todo-app").unwrap();
        assert_eq!(
            repo.endpoint(&["health"]).unwrap().as_str(),
            "http://proxy.test/todo-app/api/health"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(RemoteTodoRepository::new("not a url").is_err());
        assert!(RemoteTodoRepository::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn health_report_requires_reachable_store() {
        let up: HealthReport = serde_json::from_str(r#"{"ok":true,"db":true}"#).unwrap();
        let store_down: HealthReport =
            serde_json::from_str(r#"{"ok":true,"db":false,"error":"boom"}"#).unwrap();
        let legacy: HealthReport = serde_json::from_str(r#"{"ok":true}"#).unwrap();

        assert!(up.store_reachable());
        assert!(!store_down.store_reachable());
        assert!(legacy.store_reachable());
    }
}
