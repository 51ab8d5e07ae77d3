//! Source attribution: passages to a deduplicated citation list.

use std::collections::HashSet;

use anchor_core::{Citation, Passage};

/// Collapse passage provenance into citations.
///
/// Order is first appearance in `passages`. A repeated `source_name` is
/// skipped, so the first passage's url wins for that name.
pub fn attribute(passages: &[Passage]) -> Vec<Citation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut citations = Vec::new();
    for p in passages {
        if seen.insert(p.source_name.as_str()) {
            citations.push(Citation {
                name: p.source_name.clone(),
                url: p.source_url.clone(),
            });
        }
    }
    citations
}
