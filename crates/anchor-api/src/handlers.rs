//! Route handler functions for all API endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use anchor_chat::SubmitOutcome;
use anchor_core::{AssistantTurn, Citation, KnowledgeBaseStats, Turn, TurnPhase};

use crate::error::ApiError;
use crate::state::AppState;

/// Upper bound on the knowledge-base probe made by `/health` and `/stats`.
const STATS_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatOutcome {
    Settled,
    Ignored,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub outcome: ChatOutcome,
    pub turn: Option<AssistantTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub turns: Vec<Turn>,
    pub phase: Option<TurnPhase>,
    pub phase_label: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub subject: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourcesResponse {
    pub sources: Vec<Citation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub subject: String,
    pub model: String,
    pub collection_count: Option<u64>,
    pub source_count: Option<u64>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub model: String,
    pub knowledge_base: Option<KnowledgeBaseStats>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /chat - submit a question and wait for the turn to settle.
///
/// The turn runs on its own task so a client disconnect cannot cut it
/// short; it always reaches an assistant turn.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let orchestrator = Arc::clone(&state.orchestrator);
    let outcome = tokio::spawn(async move { orchestrator.submit(&request.message).await })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Chat turn task failed");
            ApiError::Internal("chat turn failed unexpectedly".to_string())
        })?;

    match outcome {
        SubmitOutcome::Settled(turn) => Ok(Json(ChatResponse {
            outcome: ChatOutcome::Settled,
            turn: Some(turn),
        })),
        SubmitOutcome::Ignored => Ok(Json(ChatResponse {
            outcome: ChatOutcome::Ignored,
            turn: None,
        })),
        SubmitOutcome::Busy => Err(ApiError::Conflict(
            "a question is already being answered".to_string(),
        )),
        SubmitOutcome::TooLong { limit } => Err(ApiError::UnprocessableEntity(format!(
            "message exceeds maximum length of {} characters",
            limit
        ))),
    }
}

/// GET /history - the conversation so far and the in-flight phase.
pub async fn history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let orchestrator = &state.orchestrator;
    Json(HistoryResponse {
        turns: orchestrator.history(),
        phase: orchestrator.phase(),
        phase_label: orchestrator.phase_label(),
    })
}

/// GET /suggestions - starter questions.
pub async fn suggestions(State(state): State<AppState>) -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        subject: state.orchestrator.subject().to_string(),
        questions: state.starter_questions.as_ref().clone(),
    })
}

/// GET /sources - every source cited in this session.
pub async fn sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: state.orchestrator.session_sources(),
    })
}

/// GET /health - liveness plus informational knowledge-base stats.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;
    let stats = probe_stats(&state).await;
    Json(HealthResponse {
        status: "ok".to_string(),
        subject: orchestrator.subject().to_string(),
        model: orchestrator.model().to_string(),
        collection_count: stats.as_ref().map(|s| s.collection_count),
        source_count: stats.as_ref().and_then(|s| s.source_count),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /stats - chunk and source counts with the knowledge base's source list.
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        model: state.orchestrator.model().to_string(),
        knowledge_base: probe_stats(&state).await,
    })
}

async fn probe_stats(state: &AppState) -> Option<KnowledgeBaseStats> {
    match tokio::time::timeout(STATS_PROBE_TIMEOUT, state.orchestrator.knowledge_base_stats()).await {
        Ok(stats) => stats,
        Err(_) => {
            tracing::debug!("Knowledge-base stats probe timed out");
            None
        }
    }
}
