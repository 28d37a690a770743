//! Client-side error taxonomy shared by both repository variants.

use std::error::Error;
use std::fmt::{Display, Formatter};
use todo_core::{RepoError, TodoId};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug)]
pub enum ClientError {
    /// Rejected input (blank text, malformed body).
    Validation(String),
    /// The id does not exist, in either backing store.
    NotFound(TodoId),
    /// Non-success status from the API that is not a validation/not-found.
    Http { status: u16, message: String },
    /// The API could not be reached or answered with an unreadable body.
    Transport(reqwest::Error),
    InvalidBaseUrl(String),
    /// Local backing store failure.
    Storage(RepoError),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::Http { status, message } => write!(f, "api error {status}: {message}"),
            Self::Transport(err) => write!(f, "api unreachable: {err}"),
            Self::InvalidBaseUrl(url) => write!(f, "invalid api base url `{url}`"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ClientError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err.to_string()),
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(RepoError::Storage(value))
    }
}
