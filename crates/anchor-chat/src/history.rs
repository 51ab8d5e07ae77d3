//! Append-only conversation log for one session.

use std::collections::HashSet;

use anchor_core::{AssistantTurn, Citation, Turn, UserTurn};

/// Ordered log of turns. Turns can be appended and read, never removed or
/// edited.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, turn: UserTurn) {
        self.turns.push(Turn::User(turn));
    }

    pub fn append_assistant(&mut self, turn: AssistantTurn) {
        debug_assert!(
            matches!(self.turns.last(), Some(Turn::User(_))),
            "assistant turn must follow a user turn"
        );
        self.turns.push(Turn::Assistant(turn));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Every source cited so far in the session, first-seen order, one entry
    /// per name.
    pub fn session_sources(&self) -> Vec<Citation> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.turns
            .iter()
            .filter_map(Turn::as_assistant)
            .flat_map(|t| t.citations.iter())
            .filter(|c| seen.insert(c.name.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cite(name: &str, url: &str) -> Citation {
        Citation {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = ConversationHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
        assert!(history.last().is_none());
    }

    #[test]
    fn test_appends_preserve_order() {
        let mut history = ConversationHistory::new();
        history.append_user(UserTurn::new("first"));
        history.append_assistant(AssistantTurn::answer("one", vec![]));
        history.append_user(UserTurn::new("second"));
        history.append_assistant(AssistantTurn::error("boom"));

        let texts: Vec<&str> = history.turns().iter().map(Turn::text).collect();
        assert_eq!(texts, vec!["first", "one", "second", "boom"]);
        assert!(history.turns()[0].is_user());
        assert!(history.last().unwrap().as_assistant().unwrap().is_error);
    }

    #[test]
    fn test_session_sources_dedup_across_turns() {
        let mut history = ConversationHistory::new();
        history.append_user(UserTurn::new("q1"));
        history.append_assistant(AssistantTurn::answer(
            "a1",
            vec![cite("wikipedia", "https://w"), cite("imdb", "https://i")],
        ));
        history.append_user(UserTurn::new("q2"));
        history.append_assistant(AssistantTurn::answer(
            "a2",
            vec![cite("cbc", "https://c"), cite("wikipedia", "https://w2")],
        ));

        let sources = history.session_sources();
        assert_eq!(
            sources,
            vec![
                cite("wikipedia", "https://w"),
                cite("imdb", "https://i"),
                cite("cbc", "https://c"),
            ]
        );
    }

    #[test]
    fn test_session_sources_skip_error_turns() {
        let mut history = ConversationHistory::new();
        history.append_user(UserTurn::new("q"));
        history.append_assistant(AssistantTurn::error("nope"));
        assert!(history.session_sources().is_empty());
    }
}
