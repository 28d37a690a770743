//! Mapping of request failures to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::{json, Map, Value};
use todo_core::RepoError;

#[derive(Debug)]
pub enum ApiError {
    /// Body is not JSON or does not have the expected shape.
    InvalidJson,
    /// Query string names an unsupported option.
    InvalidQuery(&'static str),
    Repo(RepoError),
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidJson => (StatusCode::BAD_REQUEST, "invalid JSON".to_string()),
            Self::InvalidQuery(message) => (StatusCode::BAD_REQUEST, message.to_string()),
            Self::Repo(RepoError::Validation(err)) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Repo(RepoError::NotFound(_)) => (StatusCode::NOT_FOUND, "not found".to_string()),
            Self::Repo(err) => {
                error!("event=request_failed module=api status=error error={err}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Parses a JSON object request body; an empty body reads as `{}`.
///
/// Only objects are accepted. Derived structs would otherwise also decode
/// from arrays by position.
pub fn parse_json_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?
    };
    if !value.is_object() {
        return Err(ApiError::InvalidJson);
    }
    serde_json::from_value(value).map_err(|_| ApiError::InvalidJson)
}

#[cfg(test)]
mod tests {
    use super::{parse_json_body, ApiError};
    use todo_core::TodoPatch;

    #[test]
    fn empty_body_reads_as_empty_object() {
        let patch: TodoPatch = parse_json_body(b"").unwrap();
        assert!(patch.is_empty());
        let patch: TodoPatch = parse_json_body(b" \n").unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        let bodies: [&[u8]; 6] = [
            b"[1,2]",
            b"[\"renamed\", true]",
            b"null",
            b"\"text\"",
            b"{\"completed\":\"yes\"}",
            b"{oops",
        ];
        for body in bodies {
            let result = parse_json_body::<TodoPatch>(body);
            assert!(matches!(result, Err(ApiError::InvalidJson)));
        }
    }
}
