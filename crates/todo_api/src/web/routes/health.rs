use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::web::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Always 200: store reachability is reported in the payload so clients can
/// tell "server up, store down" from "server unreachable".
async fn health(State(state): State<AppState>) -> Json<Value> {
    let health = state.store.health();
    match health.error {
        Some(error) => Json(json!({ "ok": true, "db": false, "error": error })),
        None => Json(json!({ "ok": true, "db": health.reachable })),
    }
}
