//! End-to-end pipeline: graph view -> candidates -> sections -> metrics.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::PackConfig;
use crate::errors::PackResult;
use crate::graph::view::build_graph_view_at;
use crate::models::{ContextPack, GraphDocument};
use crate::query::assembly::assemble_sections;
use crate::query::candidates::score_candidates;

/// Build a context pack, measuring recency against the current time.
pub fn pack_graph(
    graph: &GraphDocument,
    intent: &str,
    budget_tokens: i64,
    diff_paths: &[String],
    config: &PackConfig,
) -> ContextPack {
    pack_graph_at(graph, intent, budget_tokens, diff_paths, config, Utc::now())
}

/// Build a context pack with an explicit reference time. Identical inputs
/// produce identical packs.
pub fn pack_graph_at(
    graph: &GraphDocument,
    intent: &str,
    budget_tokens: i64,
    diff_paths: &[String],
    config: &PackConfig,
    now: DateTime<Utc>,
) -> ContextPack {
    let view = build_graph_view_at(graph, intent, diff_paths, config, now);
    let ranking = score_candidates(&view, config);
    let assembly = assemble_sections(&view, &ranking, budget_tokens, config);
    info!(
        "Packed {} sections ({} tokens of {}) from {} candidates",
        assembly.sections.len(),
        assembly.metrics.token_in,
        budget_tokens,
        ranking.len()
    );
    ContextPack {
        intent: intent.to_string(),
        budget: budget_tokens.to_string(),
        sections: assembly.sections,
        metrics: assembly.metrics,
    }
}

pub fn read_graph(path: &Path) -> PackResult<GraphDocument> {
    let text = std::fs::read_to_string(path)?;
    GraphDocument::from_json_str(&text)
}

/// Changed paths from one or more newline-separated files. Blank lines are
/// dropped.
pub fn read_diff_paths<P: AsRef<Path>>(files: &[P]) -> PackResult<Vec<String>> {
    let mut paths = Vec::new();
    for file in files {
        let text = std::fs::read_to_string(file)?;
        paths.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    Ok(paths)
}

/// Read the graph at `graph_path` and pack it.
pub fn pack_graph_file(
    graph_path: &Path,
    intent: &str,
    budget_tokens: i64,
    diff_paths: &[String],
    config: &PackConfig,
) -> PackResult<ContextPack> {
    let graph = read_graph(graph_path)?;
    Ok(pack_graph(&graph, intent, budget_tokens, diff_paths, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PackError;
    use crate::fixtures::{chain_graph, sample_graph};
    use crate::models::{GraphEdge, GraphNode};

    fn diff(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_pack_prioritises_changed_file() {
        let now = Utc::now();
        let pack = pack_graph_at(
            &sample_graph(now),
            "INT-9 implement rollout",
            400,
            &diff(&["docs/b.md"]),
            &PackConfig::default(),
            now,
        );
        assert_eq!(pack.intent, "INT-9 implement rollout");
        assert_eq!(pack.budget, "400");
        assert_eq!(pack.sections[0].id, "docs/b.md#ops");
        assert!(pack.metrics.token_in <= 400);
        let pprs: Vec<f64> = pack.sections.iter().map(|s| s.why.ppr).collect();
        assert!(pprs[1..].iter().all(|p| pprs[0] >= *p));
    }

    #[test]
    fn test_chain_scenario_places_changed_hit_first() {
        let pack = pack_graph(
            &chain_graph(),
            "implement rollout",
            10_000,
            &diff(&["src/c.md"]),
            &PackConfig::default(),
        );
        assert_eq!(pack.sections.len(), 3);
        assert_eq!(pack.sections[0].id, "C");
        assert_eq!(pack.sections[0].why.diff, 1.0);
        assert_eq!(pack.sections[0].why.intent, 0.5);
    }

    #[test]
    fn test_tiny_budget_still_reports_source_tokens() {
        let pack = pack_graph(&chain_graph(), "rollout", 10, &[], &PackConfig::default());
        assert!(pack.sections.is_empty());
        assert_eq!(pack.metrics.token_in, 0);
        // Three one-word headings at the 32-token floor.
        assert_eq!(pack.metrics.token_src, 96);
    }

    #[test]
    fn test_shared_path_sections_report_duplication() {
        let graph = GraphDocument::new(
            vec![
                GraphNode::new("one", "shared.md", "First part"),
                GraphNode::new("two", "shared.md", "Second part"),
            ],
            vec![GraphEdge::new("one", "two")],
        );
        let pack = pack_graph(&graph, "part", 1_000, &[], &PackConfig::default());
        assert_eq!(pack.sections.len(), 2);
        assert!(pack.metrics.dup_rate > 0.0);

        let single = pack_graph(&graph, "part", 32, &[], &PackConfig::default());
        assert_eq!(single.sections.len(), 1);
        assert_eq!(single.metrics.dup_rate, 0.0);
    }

    #[test]
    fn test_identical_inputs_give_identical_json() {
        let now = Utc::now();
        let graph = sample_graph(now);
        let config = PackConfig::default();
        let run = || {
            let pack = pack_graph_at(&graph, "ops rollout", 500, &diff(&["docs/a.md"]), &config, now);
            serde_json::to_string(&pack).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_pack_graph_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.json");
        let diff_path = dir.path().join("diff.txt");
        std::fs::write(
            &graph_path,
            r#"{"nodes": [{"id": "a.md#x", "path": "a.md", "heading": "Rollout"}, {"id": 3}],
               "edges": [["a.md#x", "missing"]], "meta": {"version": "1"}}"#,
        )
        .unwrap();
        std::fs::write(&diff_path, "a.md\n\n  b.md  \n").unwrap();

        let diff_paths = read_diff_paths(&[&diff_path]).unwrap();
        assert_eq!(diff_paths, vec!["a.md", "b.md"]);
        let pack =
            pack_graph_file(&graph_path, "rollout", 100, &diff_paths, &PackConfig::default())
                .unwrap();
        assert_eq!(pack.sections.len(), 1);
        assert_eq!(pack.sections[0].why.diff, 1.0);
    }

    #[test]
    fn test_unbounded_token_estimates_stay_within_budget() {
        for estimate in ["9223372036854775807", "1e30"] {
            let text = format!(
                r#"{{"nodes": [
                    {{"id": "a", "path": "a.md", "heading": "Rollout", "token_estimate": {estimate}}},
                    {{"id": "b", "path": "b.md", "heading": "Rollout", "token_estimate": 5}}
                ]}}"#
            );
            let graph = GraphDocument::from_json_str(&text).unwrap();
            let now = Utc::now();
            let pack = pack_graph_at(&graph, "rollout", 100, &[], &PackConfig::default(), now);
            let ids: Vec<&str> = pack.sections.iter().map(|s| s.id.as_str()).collect();
            assert_eq!(ids, vec!["b"], "estimate {estimate}");
            assert_eq!(pack.metrics.token_in, 5);
            assert_eq!(pack.metrics.token_src, i64::MAX);
        }
    }

    #[test]
    fn test_missing_graph_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = pack_graph_file(
            &dir.path().join("nope.json"),
            "x",
            10,
            &[],
            &PackConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PackError::Io(_)));
    }
}
