//! Shared application state for the web server.

use std::sync::Arc;

use citeseek_common::Config;

/// Shared state injected into every Axum handler. Only configuration lives
/// here: the vector index and service clients are request-scoped and built
/// per call, so concurrent requests share no mutable state.
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

pub type SharedState = Arc<AppState>;
