//! Immutable per-request view over the input graph.
//!
//! Nodes live in an arena addressed by [`NodeHandle`]; adjacency is stored as
//! handle lists so expansion and PageRank never hash ids.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::PackConfig;
use crate::graph::signals::{
    diff_signal, hub_signal, intent_profile, intent_signal, recency_signal, role_signal,
};
use crate::models::{BaseSignals, GraphDocument, GraphEdge, GraphNode, IntentProfile};
use crate::query::tokenizer::token_set;

/// Stable index of a node within a [`GraphView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub usize);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct GraphView {
    nodes: Vec<GraphNode>,
    ids: IndexMap<String, NodeHandle>,
    edges: Vec<GraphEdge>,
    intent: IntentProfile,
    forward: Vec<Vec<NodeHandle>>,
    reverse: Vec<Vec<NodeHandle>>,
    signals: Vec<BaseSignals>,
    base_scores: Vec<f64>,
    hits: Vec<NodeHandle>,
}

impl GraphView {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All handles, in original node order.
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        (0..self.nodes.len()).map(NodeHandle)
    }

    pub fn node(&self, handle: NodeHandle) -> &GraphNode {
        &self.nodes[handle.0]
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn handle_of(&self, id: &str) -> Option<NodeHandle> {
        self.ids.get(id).copied()
    }

    /// Edges whose endpoints both resolved to nodes.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn intent(&self) -> &IntentProfile {
        &self.intent
    }

    pub fn successors(&self, handle: NodeHandle) -> &[NodeHandle] {
        &self.forward[handle.0]
    }

    pub fn predecessors(&self, handle: NodeHandle) -> &[NodeHandle] {
        &self.reverse[handle.0]
    }

    pub fn signals(&self, handle: NodeHandle) -> BaseSignals {
        self.signals[handle.0]
    }

    pub fn base_score(&self, handle: NodeHandle) -> f64 {
        self.base_scores[handle.0]
    }

    /// Nodes with a nonzero intent or diff signal, in node order.
    pub fn hits(&self) -> &[NodeHandle] {
        &self.hits
    }

    /// Signals looked up by node id.
    pub fn signals_for(&self, id: &str) -> Option<BaseSignals> {
        self.handle_of(id).map(|h| self.signals(h))
    }

    pub fn base_score_for(&self, id: &str) -> Option<f64> {
        self.handle_of(id).map(|h| self.base_score(h))
    }
}

/// Build the view using the current wall-clock time for recency.
pub fn build_graph_view(
    graph: &GraphDocument,
    intent: &str,
    diff_paths: &[String],
    config: &PackConfig,
) -> GraphView {
    build_graph_view_at(graph, intent, diff_paths, config, Utc::now())
}

/// Build the view with recency measured against `now`.
pub fn build_graph_view_at(
    graph: &GraphDocument,
    intent: &str,
    diff_paths: &[String],
    config: &PackConfig,
    now: DateTime<Utc>,
) -> GraphView {
    let mut nodes: Vec<GraphNode> = Vec::with_capacity(graph.nodes.len());
    let mut ids: IndexMap<String, NodeHandle> = IndexMap::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        if ids.contains_key(&node.id) {
            warn!("Duplicate node id {:?}; keeping the first occurrence", node.id);
            continue;
        }
        ids.insert(node.id.clone(), NodeHandle(nodes.len()));
        nodes.push(node.clone());
    }

    let mut forward: Vec<Vec<NodeHandle>> = vec![Vec::new(); nodes.len()];
    let mut reverse: Vec<Vec<NodeHandle>> = vec![Vec::new(); nodes.len()];
    let mut edges: Vec<GraphEdge> = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let (Some(&src), Some(&dst)) = (ids.get(&edge.src), ids.get(&edge.dst)) else {
            debug!("Ignoring edge {} -> {} with an unknown endpoint", edge.src, edge.dst);
            continue;
        };
        forward[src.0].push(dst);
        reverse[dst.0].push(src);
        edges.push(edge.clone());
    }

    let profile = intent_profile(intent, config.recency_halflife_days);
    let weights = config.weights;
    let max_out_degree = forward.iter().map(Vec::len).max().unwrap_or(0);

    let mut signals: Vec<BaseSignals> = Vec::with_capacity(nodes.len());
    let mut base_scores: Vec<f64> = Vec::with_capacity(nodes.len());
    let mut hits: Vec<NodeHandle> = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        let tokens = token_set([node.heading.as_str(), node.path.as_str()]);
        let node_signals = BaseSignals {
            intent: intent_signal(&profile.keywords, &tokens),
            diff: diff_signal(&node.path, diff_paths),
            recency: recency_signal(node.mtime.as_deref(), profile.halflife, now),
            hub: hub_signal(forward[idx].len(), max_out_degree),
            role: role_signal(node.role.as_deref(), profile.role.as_deref()),
        };
        if node_signals.intent > 0.0 || node_signals.diff > 0.0 {
            hits.push(NodeHandle(idx));
        }
        base_scores.push(
            weights.intent * node_signals.intent
                + weights.diff * node_signals.diff
                + weights.recency * node_signals.recency
                + weights.hub * node_signals.hub
                + weights.role * node_signals.role,
        );
        signals.push(node_signals);
    }

    debug!(
        "Built graph view: {} nodes, {} edges, {} hits, {} intent keywords",
        nodes.len(),
        edges.len(),
        hits.len(),
        profile.keywords.len()
    );

    GraphView {
        nodes,
        ids,
        edges,
        intent: profile,
        forward,
        reverse,
        signals,
        base_scores,
        hits,
    }
}
