//! Planning-text detection.
//!
//! Planning text announces an action ("let me check the halls...") without
//! calling a tool. It is never accepted as a final answer.

use std::sync::OnceLock;

use regex::RegexSet;

fn planning_patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            r"(?i)let me (check|look|find|examine|see|get)",
            r"(?i)now let me",
            r"(?i)I'll (check|look|find|examine)",
            r"(?i)I will (check|look|find|examine)",
            r"(?i)by examining (their |the )?connections",
            r"(?i)examining their connections",
        ])
        .unwrap()
    })
}

pub fn is_planning_text(text: &str) -> bool {
    planning_patterns().is_match(text)
}
