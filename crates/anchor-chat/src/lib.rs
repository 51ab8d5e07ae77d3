//! Retrieval-augmented answering for Anchor.
//!
//! Retrieves passages for a question, assembles them into a prompt context,
//! asks the generation service for a grounded answer, and records the
//! exchange with deduplicated citations in an append-only session log.

pub mod attribution;
pub mod context;
pub mod error;
pub mod generator;
pub mod history;
pub mod orchestrator;
pub mod retriever;

#[cfg(test)]
pub(crate) mod testing;

pub use attribution::attribute;
pub use context::assemble;
pub use error::ChatError;
pub use generator::{grounding_instruction, AnswerGenerator, AnthropicGenerator, FALLBACK_ANSWER};
pub use history::ConversationHistory;
pub use orchestrator::{ChatOrchestrator, SubmitOutcome};
pub use retriever::{HttpRetriever, Retriever};
