//! Anchor API crate - axum HTTP surface over one chat session.
//!
//! Exposes question submission, the conversation log with its in-flight
//! phase, starter questions, session sources, knowledge-base stats and a
//! health probe.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
