pub mod health;
pub mod todos;

use axum::Router;

use crate::web::AppState;

/// Routes mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(todos::router())
}
