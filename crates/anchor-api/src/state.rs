//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use anchor_chat::ChatOrchestrator;

/// Shared application state, cloned into every handler by axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The single conversation session this server fronts.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Questions offered to new users.
    pub starter_questions: Arc<Vec<String>>,
    /// Port the server listens on, used for the CORS allow-list.
    pub port: u16,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: ChatOrchestrator, starter_questions: Vec<String>, port: u16) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            starter_questions: Arc::new(starter_questions),
            port,
            start_time: Instant::now(),
        }
    }
}
