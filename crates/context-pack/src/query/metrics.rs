//! Pack-level quality metrics.

use std::collections::HashSet;

use crate::graph::view::GraphView;
use crate::models::{GraphNode, PackMetrics};
use crate::query::assembly::SelectionLedger;
use crate::query::candidates::CandidateRanking;
use crate::query::tokenizer::estimate_tokens;

pub fn pack_metrics(
    view: &GraphView,
    ranking: &CandidateRanking,
    ledger: &SelectionLedger,
) -> PackMetrics {
    let token_src = ranking
        .ranked
        .iter()
        .map(|c| estimate_tokens(view.node(c.handle)))
        .fold(0i64, i64::saturating_add);
    let accepted: Vec<&GraphNode> = ledger.accepted.iter().map(|&h| view.node(h)).collect();
    PackMetrics {
        token_in: ledger.token_in,
        token_src,
        dup_rate: duplication_rate(&accepted),
        ppr_entropy: shannon_entropy(&ranking.ppr_scores),
        diversity_penalty: mean_discount(&ledger.penalties),
    }
}

/// File a section belongs to: its path, or the id up to `#` when the path is
/// missing.
///
/// Older pack output always split the id at `#`. The two agree whenever ids
/// are `path#anchor`; they differ only when an id prefix and the node's
/// `path` disagree, in which case `dup_rate` follows `path`.
pub fn base_path(node: &GraphNode) -> &str {
    if node.path.is_empty() {
        node.id.split('#').next().unwrap_or(&node.id)
    } else {
        &node.path
    }
}

/// `1 - distinct files / sections`; 0 when nothing was accepted.
pub fn duplication_rate(nodes: &[&GraphNode]) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = nodes.iter().map(|n| base_path(n)).collect();
    1.0 - distinct.len() as f64 / nodes.len() as f64
}

/// Natural-log entropy of `values` after L1 normalization. Zero entries are
/// skipped; an all-zero or empty input has entropy 0.
pub fn shannon_entropy(values: &[f64]) -> f64 {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return 0.0;
    }
    -values
        .iter()
        .filter(|v| **v > 0.0)
        .map(|v| {
            let p = v / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Mean of `1 - penalty` across accepted sections.
pub fn mean_discount(penalties: &[f64]) -> f64 {
    if penalties.is_empty() {
        return 0.0;
    }
    penalties.iter().map(|p| 1.0 - p).sum::<f64>() / penalties.len() as f64
}
