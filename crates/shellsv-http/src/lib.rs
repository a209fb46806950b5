//! The HTTP request surface: routes, content negotiation, and parameter
//! validation on top of `shellsv-supervisor` and `shellsv-log`.

mod error;
mod format;
mod handlers;
mod state;

use axum::Router;
use axum::routing::{get, post};

pub use state::AppState;

/// Builds the full router: `/start`, `/status`, `/kill`, `/restart`,
/// `/logs`, `/health`, all bound to one shared [`AppState`].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/start", post(handlers::start))
        .route("/status", get(handlers::status))
        .route("/kill", post(handlers::kill))
        .route("/restart", post(handlers::restart))
        .route("/logs", get(handlers::logs))
        .route("/health", get(handlers::health))
        .with_state(state)
}
