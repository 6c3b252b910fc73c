//! Graphs shared by unit tests.

use chrono::{DateTime, Duration, Utc};

use crate::models::{GraphDocument, GraphEdge, GraphNode};

pub(crate) fn days_ago(now: DateTime<Utc>, days: i64) -> Option<String> {
    Some((now - Duration::days(days)).to_rfc3339())
}

/// Three sections across two files: root -> impl -> ops.
pub(crate) fn sample_graph(now: DateTime<Utc>) -> GraphDocument {
    let mut root = GraphNode::new("docs/a.md#root", "docs/a.md", "Root Overview");
    root.depth = Some(1);
    root.mtime = days_ago(now, 5);
    root.token_estimate = Some(180);
    root.role = Some("spec".into());
    let mut implementation = GraphNode::new("docs/a.md#impl", "docs/a.md", "Implementation Notes");
    implementation.depth = Some(2);
    implementation.mtime = days_ago(now, 10);
    implementation.token_estimate = Some(220);
    implementation.role = Some("impl".into());
    let mut ops = GraphNode::new("docs/b.md#ops", "docs/b.md", "Operational Guide");
    ops.depth = Some(2);
    ops.mtime = days_ago(now, 2);
    ops.token_estimate = Some(200);
    ops.role = Some("ops".into());
    GraphDocument::new(
        vec![root, implementation, ops],
        vec![
            GraphEdge::new("docs/a.md#root", "docs/a.md#impl"),
            GraphEdge::new("docs/a.md#impl", "docs/b.md#ops"),
        ],
    )
}

/// `A -> B -> C` where only C mentions "rollout" and C lives under `src/`.
pub(crate) fn chain_graph() -> GraphDocument {
    GraphDocument::new(
        vec![
            GraphNode::new("A", "docs/a.md", "Architecture"),
            GraphNode::new("B", "docs/b.md", "Background"),
            GraphNode::new("C", "src/c.md", "Rollout checklist"),
        ],
        vec![GraphEdge::new("A", "B"), GraphEdge::new("B", "C")],
    )
}
