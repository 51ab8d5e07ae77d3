//! Answer generator client and the fixed grounding instruction.

use std::time::Duration;

use anchor_core::config::GenerationConfig;
use anchor_core::AnchorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{describe_transport_error, ChatError};

/// Answer text used when the generation service succeeds with no content.
pub const FALLBACK_ANSWER: &str = "No response generated.";

/// Build the grounding instruction for `subject`.
///
/// This is the only thing keeping answers grounded; the pipeline does not
/// check the model's output against it.
pub fn grounding_instruction(subject: &str) -> String {
    format!(
        "You are a knowledgeable research assistant specializing in {subject}.\n\n\
         Answer questions using ONLY the provided context chunks. If the context doesn't \
         contain enough information to fully answer, say what you can and note what's \
         missing. Always cite which source(s) you're drawing from.\n\n\
         Use plain text, keep it concise, and use line breaks for readability. Do not use \
         markdown headers or bullet points; use dashes if listing items."
    )
}

/// Combine the assembled context and the question into the user message.
pub fn user_message(context_block: &str, question: &str) -> String {
    format!(
        "Context chunks (from verified sources):\n\n{}\n\nQuestion: {}",
        context_block, question
    )
}

/// Produces a free-text answer from a context block and a question.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// One batch generation call. `ChatError::GenerationEmpty` signals a
    /// successful call that carried no answer text.
    async fn generate(&self, context_block: &str, question: &str) -> Result<String, ChatError>;

    /// Model identifier, for the status surface.
    fn model(&self) -> &str;
}

// =============================================================================
// Wire types (Messages API)
// =============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Pick the answer out of a parsed response.
fn first_text(resp: MessagesResponse) -> Result<String, ChatError> {
    match resp.content.into_iter().next().and_then(|block| block.text) {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ChatError::GenerationEmpty),
    }
}

// =============================================================================
// AnthropicGenerator
// =============================================================================

/// Generator backed by an Anthropic-style `/v1/messages` endpoint.
pub struct AnthropicGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_version: String,
    api_key: String,
    system_prompt: String,
}

impl std::fmt::Debug for AnthropicGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl AnthropicGenerator {
    /// Build a generator for `subject`.
    ///
    /// `config.system_prompt` replaces the built-in grounding instruction
    /// when set. The API key must be resolved by the caller.
    pub fn new(
        config: &GenerationConfig,
        api_key: impl Into<String>,
        subject: &str,
    ) -> anchor_core::Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AnchorError::Config(
                "generation API key is missing (set ANTHROPIC_API_KEY)".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnchorError::Http(format!("failed to build generation client: {}", e)))?;
        let system_prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| grounding_instruction(subject));
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_version: config.api_version.clone(),
            api_key,
            system_prompt,
        })
    }

    /// The system instruction sent with every request.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

#[async_trait]
impl AnswerGenerator for AnthropicGenerator {
    async fn generate(&self, context_block: &str, question: &str) -> Result<String, ChatError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &self.system_prompt,
            messages: vec![RequestMessage {
                role: "user",
                content: user_message(context_block, question),
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let summary = describe_transport_error(&e);
                tracing::warn!(error = %e, "Generation request failed");
                ChatError::GenerationUnavailable {
                    summary,
                    detail: e.to_string(),
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                payload = %detail,
                "Generation service returned an error status"
            );
            return Err(ChatError::GenerationUnavailable {
                summary: format!("HTTP {}", status.as_u16()),
                detail,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| ChatError::GenerationUnavailable {
            summary: describe_transport_error(&e),
            detail: e.to_string(),
        })?;
        let parsed: MessagesResponse = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(error = %e, "Generation response did not match the messages schema");
            ChatError::GenerationMalformed(e.to_string())
        })?;

        let answer = first_text(parsed)?;
        tracing::debug!(answer_len = answer.len(), model = %self.model, "Answer generated");
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
