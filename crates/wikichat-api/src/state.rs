//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use wikichat_chat::ChatOrchestrator;
use wikichat_core::WikichatConfig;

/// Shared application state.
///
/// All fields are cheap to clone; the configuration is read-only once the
/// server is running.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<WikichatConfig>,
    /// Session and submission handling.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: WikichatConfig, orchestrator: Arc<ChatOrchestrator>) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            start_time: Instant::now(),
        }
    }
}
