//! Processor catalogue route.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::http::state::AppState;
use crate::processors::traits::ProcessorDescriptor;

pub fn router() -> Router<AppState> {
    Router::new().route("/processors", get(list_processors))
}

async fn list_processors(State(state): State<AppState>) -> Json<Vec<ProcessorDescriptor>> {
    Json(state.registry.list())
}
