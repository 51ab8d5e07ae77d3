//! Retriever client: fetches ranked passages for a question.

use std::time::Duration;

use anchor_core::config::RetrievalConfig;
use anchor_core::{AnchorError, Citation, KnowledgeBaseStats, Passage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{describe_transport_error, ChatError};

/// Source of ranked passages.
///
/// Implementations must be side-effect free and idempotent; the
/// orchestrator calls `retrieve` at most once per turn.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` passages in retrieval-rank order.
    async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Passage>, ChatError>;

    /// Knowledge-base size, when the backend reports it.
    async fn stats(&self) -> Option<KnowledgeBaseStats> {
        None
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    question: &'a str,
    n_results: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    chunks: Vec<ChunkRecord>,
}

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    text: String,
    source_name: String,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    distance: Option<f32>,
}

impl From<ChunkRecord> for Passage {
    fn from(chunk: ChunkRecord) -> Self {
        Passage {
            text: chunk.text,
            source_name: chunk.source_name,
            source_url: chunk.source_url.unwrap_or_default(),
            distance: chunk.distance,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    collection_count: u64,
    #[serde(default)]
    source_count: Option<u64>,
    #[serde(default)]
    sources: Vec<SourceRecord>,
}

#[derive(Debug, Deserialize)]
struct SourceRecord {
    source_name: String,
    #[serde(default)]
    source_url: Option<String>,
}

impl From<HealthResponse> for KnowledgeBaseStats {
    /// Sources without a link are dropped; the first link seen per name wins.
    fn from(health: HealthResponse) -> Self {
        let mut sources: Vec<Citation> = Vec::new();
        for record in health.sources {
            let url = record.source_url.unwrap_or_default();
            if url.is_empty() || sources.iter().any(|c| c.name == record.source_name) {
                continue;
            }
            sources.push(Citation {
                name: record.source_name,
                url,
            });
        }
        sources.sort_by(|a, b| a.name.cmp(&b.name));

        let source_count = health
            .source_count
            .or_else(|| (!sources.is_empty()).then_some(sources.len() as u64));
        KnowledgeBaseStats {
            collection_count: health.collection_count,
            source_count,
            sources,
        }
    }
}

// =============================================================================
// HttpRetriever
// =============================================================================

/// Retriever backed by the knowledge-base service's `POST /query`.
pub struct HttpRetriever {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRetriever {
    /// Build a client whose every call is bounded by `timeout_secs`.
    pub fn new(config: &RetrievalConfig) -> anchor_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnchorError::Http(format!("failed to build retrieval client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Passage>, ChatError> {
        let resp = self
            .client
            .post(self.url("/query"))
            .json(&QueryRequest {
                question,
                n_results: k,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Retrieval request failed");
                ChatError::RetrievalUnavailable(describe_transport_error(&e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Retrieval service returned an error status");
            return Err(ChatError::RetrievalUnavailable(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let body = resp.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read retrieval response body");
            ChatError::RetrievalUnavailable(describe_transport_error(&e))
        })?;
        let parsed: QueryResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "Retrieval response did not match the chunk schema");
            ChatError::RetrievalMalformed(e.to_string())
        })?;

        let returned = parsed.chunks.len();
        let passages: Vec<Passage> = parsed.chunks.into_iter().take(k).map(Passage::from).collect();
        for (rank, p) in passages.iter().enumerate() {
            tracing::debug!(rank = rank + 1, source = %p.source_name, distance = ?p.distance, "Retrieved passage");
        }
        if returned > k {
            tracing::debug!(returned, k, "Retrieval service returned more chunks than requested");
        }
        Ok(passages)
    }

    async fn stats(&self) -> Option<KnowledgeBaseStats> {
        let resp = match self.client.get(self.url("/health")).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(status = r.status().as_u16(), "Retrieval health probe failed");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Retrieval health probe unreachable");
                return None;
            }
        };
        match resp.json::<HealthResponse>().await {
            Ok(health) => Some(health.into()),
            Err(e) => {
                tracing::debug!(error = %e, "Retrieval health probe returned an unexpected body");
                None
            }
        }
    }
}
