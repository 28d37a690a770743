use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use todo_core::model::todo::deserialize_priority_lenient;
use todo_core::{Priority, Todo, TodoPatch};

use crate::web::error::{parse_json_body, ApiError};
use crate::web::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/todos",
            get(list_todos).post(create_todo).delete(clear_todos),
        )
        .route("/todos/{id}", patch(update_todo).delete(delete_todo))
}

#[derive(Deserialize)]
struct CreateBody {
    #[serde(default)]
    text: Option<String>,
    /// Absent or out-of-domain values fall back to `medium`.
    #[serde(default, deserialize_with = "deserialize_priority_lenient")]
    priority: Option<Priority>,
}

#[derive(Deserialize)]
struct ClearQuery {
    only: Option<String>,
}

async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.store.with_service(|service| service.list())?;
    Ok(Json(todos))
}

async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let body: CreateBody = parse_json_body(&body)?;
    let text = body.text.unwrap_or_default();
    let priority = body.priority.unwrap_or_default();

    let created = state
        .store
        .with_service(|service| service.add(&text, priority))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Todo>, ApiError> {
    let patch: TodoPatch = parse_json_body(&body)?;
    let updated = state
        .store
        .with_service(|service| service.update(&id, &patch))?;
    Ok(Json(updated))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.with_service(|service| service.delete(&id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `?only=completed` removes completed rows; no query removes every row.
async fn clear_todos(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Result<StatusCode, ApiError> {
    match query.only.as_deref() {
        Some("completed") => {
            state
                .store
                .with_service(|service| service.clear_completed())?;
        }
        None => {
            state.store.with_service(|service| service.clear_all())?;
        }
        Some(_) => return Err(ApiError::InvalidQuery("only must be `completed`")),
    }
    Ok(StatusCode::NO_CONTENT)
}
