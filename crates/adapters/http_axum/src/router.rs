//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api`. Includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
