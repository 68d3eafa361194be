//! Manual reaper trigger.

use axum::extract::State;
use axum::routing::delete;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::http::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/cleanup", delete(cleanup))
}

async fn cleanup(State(state): State<AppState>) -> Json<Value> {
    let removed = state.reaper.run_once().await;
    Json(json!({ "removed": removed }))
}
