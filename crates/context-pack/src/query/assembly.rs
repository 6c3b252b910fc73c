//! Budget-constrained, diversity-aware section assembly.
//!
//! Candidates are walked in ranking order and folded into a
//! [`SelectionLedger`]. A candidate that does not fit the remaining budget is
//! skipped and the walk continues, so cheaper candidates further down can
//! still be taken.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{DiversityConfig, PackConfig};
use crate::graph::view::{GraphView, NodeHandle};
use crate::models::{PackMetrics, Section, SectionWhy, SECTION_FILTERS};
use crate::query::candidates::{CandidateRanking, RankedCandidate};
use crate::query::metrics::pack_metrics;
use crate::query::tokenizer::estimate_tokens;

/// Lowest multiplier the diversity discount can reach.
pub const MIN_DIVERSITY_PENALTY: f64 = 0.1;

const UNKNOWN_ROLE: &str = "unknown";

/// Running state of the assembly walk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionLedger {
    pub sections: Vec<Section>,
    pub accepted: Vec<NodeHandle>,
    /// Diversity multiplier applied to each accepted section.
    pub penalties: Vec<f64>,
    pub token_in: i64,
    path_counts: HashMap<String, usize>,
    role_counts: HashMap<String, usize>,
}

impl SelectionLedger {
    pub fn selected(&self) -> usize {
        self.sections.len()
    }

    /// Multiplier for a candidate given what has been accepted so far. The
    /// first accepted section is never discounted.
    pub fn diversity_penalty(
        &self,
        path: &str,
        role: Option<&str>,
        diversity: &DiversityConfig,
    ) -> f64 {
        let total = self.selected();
        if total == 0 {
            return 1.0;
        }
        let file_share = self.path_counts.get(path).copied().unwrap_or(0) as f64 / total as f64;
        let role_share = self
            .role_counts
            .get(role.unwrap_or(UNKNOWN_ROLE))
            .copied()
            .unwrap_or(0) as f64
            / total as f64;
        (1.0 - (diversity.mu_file * file_share + diversity.mu_role * role_share))
            .max(MIN_DIVERSITY_PENALTY)
    }

    /// Fold step: accept `candidate` if it fits `budget_tokens`.
    pub fn consider(
        mut self,
        view: &GraphView,
        candidate: &RankedCandidate,
        budget_tokens: i64,
        diversity: &DiversityConfig,
    ) -> Self {
        let node = view.node(candidate.handle);
        let tokens = estimate_tokens(node);
        // An estimate large enough to overflow the running total never fits.
        let Some(token_in) = self
            .token_in
            .checked_add(tokens)
            .filter(|total| *total <= budget_tokens)
        else {
            return self;
        };
        let role = node.role.as_deref();
        let penalty = self.diversity_penalty(&node.path, role, diversity);
        let why = SectionWhy::new(
            view.signals(candidate.handle),
            candidate.ppr,
            candidate.score * penalty,
        );
        self.sections.push(Section {
            id: node.id.clone(),
            tok: tokens,
            filters: SECTION_FILTERS.iter().map(|f| f.to_string()).collect(),
            why,
        });
        self.accepted.push(candidate.handle);
        self.penalties.push(penalty);
        self.token_in = token_in;
        *self.path_counts.entry(node.path.clone()).or_insert(0) += 1;
        *self
            .role_counts
            .entry(role.unwrap_or(UNKNOWN_ROLE).to_string())
            .or_insert(0) += 1;
        self
    }
}

/// Assembled sections plus their quality metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct Assembly {
    pub sections: Vec<Section>,
    pub metrics: PackMetrics,
}

/// Walk the ranking and return the ledger of accepted sections.
pub fn walk_ranking(
    view: &GraphView,
    ranking: &CandidateRanking,
    budget_tokens: i64,
    config: &PackConfig,
) -> SelectionLedger {
    let diversity = config.diversity;
    ranking
        .ranked
        .iter()
        .fold(SelectionLedger::default(), |ledger, candidate| {
            ledger.consider(view, candidate, budget_tokens, &diversity)
        })
}

pub fn assemble_sections(
    view: &GraphView,
    ranking: &CandidateRanking,
    budget_tokens: i64,
    config: &PackConfig,
) -> Assembly {
    let ledger = walk_ranking(view, ranking, budget_tokens, config);
    let metrics = pack_metrics(view, ranking, &ledger);
    debug!(
        "Assembled {} of {} candidates using {}/{} tokens",
        ledger.selected(),
        ranking.ranked.len(),
        metrics.token_in,
        budget_tokens
    );
    Assembly {
        sections: ledger.sections,
        metrics,
    }
}
