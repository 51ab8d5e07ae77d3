//! Prompt context assembly.

use anchor_core::Passage;

/// Separator between passage blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

/// Render passages as labeled blocks in retrieval order.
///
/// Block `i` (1-based) is always the passage at rank `i`. An empty slice
/// yields an empty string; the generator is still called in that case and
/// the grounding instruction makes it say the sources are insufficient.
pub fn assemble(passages: &[Passage]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[Chunk {} | Source: {}]\n{}", i + 1, p.source_name, p.text))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::passage;

    #[test]
    fn test_empty_passages_give_empty_context() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn test_single_passage_block() {
        let ctx = assemble(&[passage("Born in Winnipeg.", "wikipedia", "https://w")]);
        assert_eq!(ctx, "[Chunk 1 | Source: wikipedia]\nBorn in Winnipeg.");
    }

    #[test]
    fn test_blocks_separated_by_blank_line() {
        let ctx = assemble(&[passage("one", "a", ""), passage("two", "b", "")]);
        assert_eq!(
            ctx,
            "[Chunk 1 | Source: a]\none\n\n[Chunk 2 | Source: b]\ntwo"
        );
    }

    #[test]
    fn test_order_follows_rank_not_content() {
        let passages = vec![
            passage("zebra", "z_source", ""),
            passage("apple", "a_source", ""),
            passage("mango", "m_source", ""),
        ];
        let ctx = assemble(&passages);
        let z = ctx.find("[Chunk 1 | Source: z_source]\nzebra").unwrap();
        let a = ctx.find("[Chunk 2 | Source: a_source]\napple").unwrap();
        let m = ctx.find("[Chunk 3 | Source: m_source]\nmango").unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn test_full_text_is_kept() {
        let long = "word ".repeat(2_000);
        let ctx = assemble(&[passage(&long, "s", "")]);
        assert!(ctx.ends_with(&long));
    }

    #[test]
    fn test_duplicate_sources_keep_separate_blocks() {
        let ctx = assemble(&[
            passage("first part", "nubian_show_history", "https://a"),
            passage("second part", "nubian_show_history", "https://b"),
        ]);
        assert!(ctx.contains("[Chunk 1 | Source: nubian_show_history]\nfirst part"));
        assert!(ctx.contains("[Chunk 2 | Source: nubian_show_history]\nsecond part"));
    }
}
