//! Shared application state for axum handlers.

use std::sync::Arc;

use viamon_app::monitor::Fleet;

/// Application state shared across all axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Every running device monitor.
    pub fleet: Arc<Fleet>,
}

impl AppState {
    #[must_use]
    pub fn new(fleet: Arc<Fleet>) -> Self {
        Self { fleet }
    }
}
