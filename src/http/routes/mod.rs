//! Route composition.

mod cleanup;
mod health;
mod jobs;
mod processors;

use axum::Router;

use crate::http::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(jobs::router())
        .merge(processors::router())
        .merge(health::router())
        .merge(cleanup::router())
        .with_state(state)
}
