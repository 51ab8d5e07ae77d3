//! Shared domain types: passages, citations, conversation turns and the
//! in-flight phase marker.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Retrieval
// =============================================================================

/// A retrieved unit of source text with its provenance.
///
/// Created per query and discarded once the turn settles; only the
/// citations derived from it outlive the turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    /// Identifier shared by every passage cut from the same document.
    pub source_name: String,
    /// May be empty.
    pub source_url: String,
    /// Similarity distance reported by the retrieval service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl Passage {
    pub fn new(
        text: impl Into<String>,
        source_name: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_name: source_name.into(),
            source_url: source_url.into(),
            distance: None,
        }
    }
}

/// A deduplicated source reference shown alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub name: String,
    pub url: String,
}

/// Size of the knowledge base as reported by the retrieval service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseStats {
    /// Number of indexed chunks.
    pub collection_count: u64,
    /// Number of distinct source documents, when reported.
    pub source_count: Option<u64>,
    /// Distinct sources with a link, sorted by name. Empty when not reported.
    #[serde(default)]
    pub sources: Vec<Citation>,
}

// =============================================================================
// Conversation
// =============================================================================

/// A message typed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTurn {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl UserTurn {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// The settled response to a user turn, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantTurn {
    pub id: Uuid,
    pub text: String,
    pub citations: Vec<Citation>,
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

impl AssistantTurn {
    /// A grounded answer with its citations.
    pub fn answer(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            citations,
            is_error: false,
            created_at: Utc::now(),
        }
    }

    /// An error turn. Never carries citations.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            citations: Vec::new(),
            is_error: true,
            created_at: Utc::now(),
        }
    }
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Turn {
    User(UserTurn),
    Assistant(AssistantTurn),
}

impl Turn {
    pub fn text(&self) -> &str {
        match self {
            Turn::User(t) => &t.text,
            Turn::Assistant(t) => &t.text,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Turn::User(_))
    }

    pub fn as_assistant(&self) -> Option<&AssistantTurn> {
        match self {
            Turn::Assistant(t) => Some(t),
            Turn::User(_) => None,
        }
    }
}

// =============================================================================
// In-flight phase
// =============================================================================

/// What an in-flight turn is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    Retrieving,
    Generating,
}

impl TurnPhase {
    /// Stable machine-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::Retrieving => "retrieving",
            TurnPhase::Generating => "generating",
        }
    }

    /// Loading message shown to the user while the phase is active.
    pub fn describe(&self, subject: &str) -> String {
        match self {
            TurnPhase::Retrieving => format!("Searching {} research...", subject),
            TurnPhase::Generating => "Composing an answer...".to_string(),
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
