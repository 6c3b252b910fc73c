//! Budget planning: which sections a pack would target and how much of the
//! budget it would leave unused, without building the full response.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::PackConfig;
use crate::graph::view::build_graph_view_at;
use crate::models::GraphDocument;
use crate::query::assembly::walk_ranking;
use crate::query::candidates::score_candidates;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContextPackPlan {
    /// Every ranked candidate id, best first.
    pub target_candidates: Vec<String>,
    /// Ids that fit the budget, in acceptance order.
    pub selected: Vec<String>,
    pub token_in: i64,
    pub budget_remaining: i64,
}

#[derive(Clone, Debug, Default)]
pub struct ContextPackPlanner {
    config: PackConfig,
}

impl ContextPackPlanner {
    pub fn new(config: PackConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn build_plan(
        &self,
        graph: &GraphDocument,
        intent: &str,
        budget_tokens: i64,
        diff_paths: &[String],
    ) -> ContextPackPlan {
        self.build_plan_at(graph, intent, budget_tokens, diff_paths, Utc::now())
    }

    pub fn build_plan_at(
        &self,
        graph: &GraphDocument,
        intent: &str,
        budget_tokens: i64,
        diff_paths: &[String],
        now: DateTime<Utc>,
    ) -> ContextPackPlan {
        let view = build_graph_view_at(graph, intent, diff_paths, &self.config, now);
        let ranking = score_candidates(&view, &self.config);
        let ledger = walk_ranking(&view, &ranking, budget_tokens, &self.config);
        ContextPackPlan {
            target_candidates: ranking.ranked_ids(&view),
            selected: ledger.sections.iter().map(|s| s.id.clone()).collect(),
            token_in: ledger.token_in,
            budget_remaining: budget_tokens.saturating_sub(ledger.token_in),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_graph;

    #[test]
    fn test_plan_candidates_and_budget() {
        let now = Utc::now();
        let planner = ContextPackPlanner::default();
        let plan = planner.build_plan_at(
            &sample_graph(now),
            "INT-9 implement rollout",
            400,
            &["docs/b.md".to_string()],
            now,
        );
        assert_eq!(
            plan.target_candidates,
            vec!["docs/b.md#ops", "docs/a.md#impl", "docs/a.md#root"]
        );
        assert_eq!(plan.selected, vec!["docs/b.md#ops", "docs/a.md#root"]);
        assert_eq!(plan.token_in, 380);
        assert_eq!(plan.budget_remaining, 20);
    }

    #[test]
    fn test_plan_with_empty_graph() {
        let plan = ContextPackPlanner::default().build_plan(&GraphDocument::default(), "x", 50, &[]);
        assert!(plan.target_candidates.is_empty());
        assert_eq!(plan.budget_remaining, 50);
    }
}
