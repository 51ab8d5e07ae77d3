//! Chat orchestrator: drives one turn from submission to settlement.
//!
//! A turn moves through `Idle -> Validating -> Retrieving -> Generating ->
//! Settling -> Idle`. The orchestrator owns the session's history and its
//! in-flight phase marker; nothing else writes either.

use std::sync::{Arc, Mutex, MutexGuard};

use anchor_core::{
    AnchorConfig, AssistantTurn, Citation, KnowledgeBaseStats, Turn, TurnPhase, UserTurn,
};

use crate::attribution::attribute;
use crate::context::assemble;
use crate::error::ChatError;
use crate::generator::{AnswerGenerator, FALLBACK_ANSWER};
use crate::history::ConversationHistory;
use crate::retriever::Retriever;

/// Text of the error turn appended when a turn is dropped before settling.
const INTERRUPTED_MESSAGE: &str =
    "Sorry, this question was interrupted before an answer was ready. Please try again.";

/// Result of handing input to [`ChatOrchestrator::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Input was blank after trimming. Nothing changed.
    Ignored,
    /// Another turn is in flight. Nothing changed.
    Busy,
    /// Input exceeded the configured length. Nothing changed.
    TooLong { limit: usize },
    /// The turn ran to completion; this is the assistant turn it appended.
    Settled(AssistantTurn),
}

#[derive(Debug, Default)]
struct SessionState {
    history: ConversationHistory,
    phase: Option<TurnPhase>,
}

/// Coordinates retrieval, generation and attribution for one conversation.
pub struct ChatOrchestrator {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    subject: String,
    n_results: usize,
    max_message_length: usize,
    session: Mutex<SessionState>,
}

impl ChatOrchestrator {
    pub fn new(
        config: &AnchorConfig,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            retriever,
            generator,
            subject: config.general.subject.clone(),
            n_results: config.retrieval.n_results,
            max_message_length: config.chat.max_message_length,
            session: Mutex::new(SessionState::default()),
        }
    }

    /// Run one turn for `input`.
    ///
    /// Blank input and input submitted while another turn is in flight are
    /// refused without touching the session. Otherwise the user turn is
    /// appended before any external call, and exactly one assistant turn is
    /// appended when the turn settles, whether it succeeded or not.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let question = input.trim();

        let turn = {
            let mut session = self.session();
            if let Some(phase) = session.phase {
                tracing::debug!(phase = %phase, "Submission rejected: a turn is already in flight");
                return SubmitOutcome::Busy;
            }
            if question.is_empty() {
                return SubmitOutcome::Ignored;
            }
            if question.chars().count() > self.max_message_length {
                tracing::debug!(limit = self.max_message_length, "Submission rejected: too long");
                return SubmitOutcome::TooLong {
                    limit: self.max_message_length,
                };
            }
            session.history.append_user(UserTurn::new(question));
            session.phase = Some(TurnPhase::Retrieving);
            InFlight {
                orchestrator: self,
                settled: false,
            }
        };

        tracing::info!(question_len = question.len(), "Turn started");

        let passages = match self.retriever.retrieve(question, self.n_results).await {
            Ok(passages) => passages,
            Err(e) => return SubmitOutcome::Settled(turn.settle(error_turn(&e))),
        };
        tracing::debug!(passages = passages.len(), "Passages retrieved");

        turn.enter(TurnPhase::Generating);
        let context_block = assemble(&passages);
        let answer = match self.generator.generate(&context_block, question).await {
            Ok(text) => text,
            Err(ChatError::GenerationEmpty) => {
                tracing::warn!("Generation returned no content; using fallback answer");
                FALLBACK_ANSWER.to_string()
            }
            Err(e) => return SubmitOutcome::Settled(turn.settle(error_turn(&e))),
        };

        let citations = attribute(&passages);
        tracing::info!(citations = citations.len(), "Turn settled");
        SubmitOutcome::Settled(turn.settle(AssistantTurn::answer(answer, citations)))
    }

    /// Snapshot of the conversation so far.
    pub fn history(&self) -> Vec<Turn> {
        self.session().history.turns().to_vec()
    }

    /// Current phase of the in-flight turn, if any.
    pub fn phase(&self) -> Option<TurnPhase> {
        self.session().phase
    }

    /// Loading message for the in-flight turn, if any.
    pub fn phase_label(&self) -> Option<String> {
        self.phase().map(|p| p.describe(&self.subject))
    }

    pub fn is_busy(&self) -> bool {
        self.phase().is_some()
    }

    /// All sources cited so far in this session.
    pub fn session_sources(&self) -> Vec<Citation> {
        self.session().history.session_sources()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Knowledge-base size as reported by the retriever. Informational only.
    pub async fn knowledge_base_stats(&self) -> Option<KnowledgeBaseStats> {
        self.retriever.stats().await
    }

    fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Session lock poisoned; recovering state");
            poisoned.into_inner()
        })
    }
}

/// Error turn for a failed collaborator call.
fn error_turn(err: &ChatError) -> AssistantTurn {
    let stage = if err.is_retrieval() { "retrieval" } else { "generation" };
    tracing::warn!(stage, error = %err, "Turn failed");
    AssistantTurn::error(err.user_message())
}

/// Marks a turn as in flight until it settles.
///
/// Dropping it unsettled (the `submit` future was cancelled) still appends
/// an error turn and clears the phase, so the session never stays busy.
struct InFlight<'a> {
    orchestrator: &'a ChatOrchestrator,
    settled: bool,
}

impl InFlight<'_> {
    fn enter(&self, phase: TurnPhase) {
        self.orchestrator.session().phase = Some(phase);
    }

    fn settle(mut self, turn: AssistantTurn) -> AssistantTurn {
        self.settled = true;
        let mut session = self.orchestrator.session();
        session.history.append_assistant(turn.clone());
        session.phase = None;
        turn
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!("Turn dropped before settling; recording error turn");
        let mut session = self.orchestrator.session();
        session
            .history
            .append_assistant(AssistantTurn::error(INTERRUPTED_MESSAGE));
        session.phase = None;
    }
}

// =============================================================================
// Tests
// =============================================================================
