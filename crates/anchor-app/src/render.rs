//! Plain-text rendering of assistant turns for the terminal.

use anchor_core::{AssistantTurn, Citation, KnowledgeBaseStats};

/// The answer text followed by a "Sources:" list when there is one.
pub fn render_turn(turn: &AssistantTurn) -> String {
    let mut out = turn.text.clone();
    if !turn.citations.is_empty() {
        out.push_str("\n\n");
        out.push_str(&render_sources(&turn.citations));
    }
    out
}

pub fn render_sources(citations: &[Citation]) -> String {
    let mut out = String::from("Sources:");
    for citation in citations {
        out.push_str("\n- ");
        out.push_str(&citation.name);
        if !citation.url.is_empty() {
            out.push_str(&format!(" <{}>", citation.url));
        }
    }
    out
}

/// Chunk and source counts, followed by the knowledge base's source list.
pub fn render_stats(stats: Option<&KnowledgeBaseStats>, model: &str) -> String {
    let Some(stats) = stats else {
        return format!("Knowledge base unavailable\nModel: {}", model);
    };
    let mut out = format!("Chunks: {}", stats.collection_count);
    if let Some(count) = stats.source_count {
        out.push_str(&format!("\nSources: {}", count));
    }
    out.push_str(&format!("\nModel: {}", model));
    if !stats.sources.is_empty() {
        out.push_str("\n\n");
        out.push_str(&render_sources(&stats.sources));
    }
    out
}

pub fn render_help(subject: &str, starter_questions: &[String]) -> String {
    let mut out = format!("Ask anything about {}. Commands: /sources, /stats, /help, /quit", subject);
    if !starter_questions.is_empty() {
        out.push_str("\n\nTry one of these:");
        for question in starter_questions {
            out.push_str("\n  ");
            out.push_str(question);
        }
    }
    out
}
