pub mod drills;
pub mod health;
pub mod scoring;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

fn api() -> Router<AppState> {
    Router::new()
        .route("/attempt", post(drills::record_attempt))
        .route("/progress", get(drills::progress))
        .route("/next", post(drills::next_batch))
        .route("/score/speech", post(scoring::score_speech))
        .route("/health", get(health::health))
}

/// The drill API, served both at the root and under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(api())
        .nest("/api", api())
        .with_state(state)
}
