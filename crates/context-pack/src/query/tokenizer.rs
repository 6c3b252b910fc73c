//! Lexical tokenization and section token-cost estimation.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::GraphNode;

/// Runs of letters and digits; underscores and punctuation split tokens.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\W_]+").unwrap());

/// Floor for sections that carry no explicit estimate.
pub const MIN_SECTION_TOKENS: i64 = 32;

/// Estimated tokens per heading word when no estimate is present.
pub const TOKENS_PER_HEADING_WORD: i64 = 10;

/// Lower-cased alphanumeric tokens drawn from every part.
pub fn token_set<'a>(parts: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    parts
        .into_iter()
        .flat_map(|part| TOKEN_RE.find_iter(part))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Token cost of a section: its explicit estimate, else ten per heading word
/// with a floor of [`MIN_SECTION_TOKENS`].
pub fn estimate_tokens(node: &GraphNode) -> i64 {
    match node.token_estimate {
        Some(estimate) => estimate,
        None => {
            let words = node.heading.split_whitespace().count() as i64;
            (words * TOKENS_PER_HEADING_WORD).max(MIN_SECTION_TOKENS)
        }
    }
}
