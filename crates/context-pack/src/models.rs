//! Shared typed models: the input graph document, per-node signals, and the
//! serialized context pack.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::PackResult;

// ---------------------------------------------------------------------------
// Contract constants
// ---------------------------------------------------------------------------

/// Content filters attached to every assembled section.
pub const SECTION_FILTERS: [&str; 3] = ["lossless", "pointer", "role_extract"];

/// Intent roles, in the order they are matched against intent tokens.
pub const INTENT_ROLES: [&str; 4] = ["impl", "ops", "risk", "spec"];

// ---------------------------------------------------------------------------
// 1. GraphNode
// ---------------------------------------------------------------------------

/// A document section in the input graph.
///
/// Deserializing goes through [`GraphNode::from_value`], so wrong-typed
/// fields read as absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct GraphNode {
    pub id: String,
    pub path: String,
    pub heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_estimate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl GraphNode {
    /// Minimal node with an id, path and heading.
    pub fn new(id: impl Into<String>, path: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            heading: heading.into(),
            depth: None,
            mtime: None,
            token_estimate: None,
            role: None,
        }
    }

    /// Read a node record, returning `None` when it has no string `id`.
    /// Fields of the wrong type are treated as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id")?.as_str()?.to_string();
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        let token_estimate = obj.get("token_estimate").and_then(|v| match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            _ => None,
        });
        Some(Self {
            id,
            path: text("path").unwrap_or_default(),
            heading: text("heading").unwrap_or_default(),
            depth: obj.get("depth").and_then(Value::as_i64),
            mtime: text("mtime"),
            token_estimate,
            role: text("role"),
        })
    }
}

impl TryFrom<Value> for GraphNode {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value).ok_or_else(|| "node record needs a string `id`".to_string())
    }
}

// ---------------------------------------------------------------------------
// 2. GraphEdge
// ---------------------------------------------------------------------------

/// A directed link between two nodes. `kind` is carried but never scored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct GraphEdge {
    pub src: String,
    pub dst: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl GraphEdge {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            kind: None,
        }
    }

    /// Accepts `{"src", "dst", "type"}` objects and `[src, dst, type?]` arrays.
    pub fn from_value(value: &Value) -> Option<Self> {
        let (src, dst, kind) = match value {
            Value::Object(obj) => (obj.get("src")?, obj.get("dst")?, obj.get("type")),
            Value::Array(items) => (items.first()?, items.get(1)?, items.get(2)),
            _ => return None,
        };
        Some(Self {
            src: src.as_str()?.to_string(),
            dst: dst.as_str()?.to_string(),
            kind: kind.and_then(Value::as_str).map(str::to_string),
        })
    }
}

impl TryFrom<Value> for GraphEdge {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
            .ok_or_else(|| "edge record needs string `src` and `dst`".to_string())
    }
}

// ---------------------------------------------------------------------------
// 3. GraphDocument
// ---------------------------------------------------------------------------

/// The parsed node/edge graph. Malformed records are dropped, never fatal,
/// whether it is built with [`GraphDocument::from_value`] or deserialized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl From<Value> for GraphDocument {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl GraphDocument {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn from_value(value: &Value) -> Self {
        let records = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
        };
        let raw_nodes = records("nodes");
        let raw_edges = records("edges");
        let nodes: Vec<GraphNode> = raw_nodes.iter().filter_map(GraphNode::from_value).collect();
        let edges: Vec<GraphEdge> = raw_edges.iter().filter_map(GraphEdge::from_value).collect();
        let dropped_nodes = raw_nodes.len() - nodes.len();
        let dropped_edges = raw_edges.len() - edges.len();
        if dropped_nodes > 0 || dropped_edges > 0 {
            debug!("Dropped {dropped_nodes} malformed nodes and {dropped_edges} malformed edges");
        }
        Self { nodes, edges }
    }

    /// Parse graph JSON text. Only invalid JSON is an error.
    pub fn from_json_str(text: &str) -> PackResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }
}

// ---------------------------------------------------------------------------
// 4. IntentProfile / BaseSignals
// ---------------------------------------------------------------------------

/// Lexical profile of the request intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntentProfile {
    /// Sorted, deduplicated, lower-cased tokens.
    pub keywords: Vec<String>,
    pub role: Option<String>,
    pub halflife: i64,
}

/// The five per-node relevance signals, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseSignals {
    pub intent: f64,
    pub diff: f64,
    pub recency: f64,
    pub hub: f64,
    pub role: f64,
}

// ---------------------------------------------------------------------------
// 5. Output records
// ---------------------------------------------------------------------------

/// Scoring rationale attached to a section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionWhy {
    pub intent: f64,
    pub diff: f64,
    pub recency: f64,
    pub hub: f64,
    pub role: f64,
    pub ppr: f64,
    /// Composite score after the diversity discount.
    pub score: f64,
}

impl SectionWhy {
    pub fn new(signals: BaseSignals, ppr: f64, score: f64) -> Self {
        Self {
            intent: signals.intent,
            diff: signals.diff,
            recency: signals.recency,
            hub: signals.hub,
            role: signals.role,
            ppr,
            score,
        }
    }
}

/// One assembled unit of the pack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub tok: i64,
    pub filters: Vec<String>,
    pub why: SectionWhy,
}

/// Pack-level quality metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackMetrics {
    pub token_in: i64,
    pub token_src: i64,
    pub dup_rate: f64,
    pub ppr_entropy: f64,
    pub diversity_penalty: f64,
}

/// The response handed to the writer. Field names are a consumer contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextPack {
    pub intent: String,
    /// Decimal string, as existing consumers expect.
    pub budget: String,
    pub sections: Vec<Section>,
    pub metrics: PackMetrics,
}
