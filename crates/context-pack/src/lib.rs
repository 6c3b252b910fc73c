//! Context-pack core: selects a token-budgeted, ranked subset of a
//! document-section graph for a stated work intent.
//!
//! The pipeline is pure and synchronous. A [`graph::view::GraphView`] scores
//! every node against the intent and diff, [`query::candidates`] expands
//! around the hits and re-ranks them with personalized PageRank, and
//! [`query::assembly`] fills the token budget with a diversity discount.
//! With the `python` feature the crate also builds as the `_context_pack`
//! extension module.

pub mod config;
pub mod errors;
pub mod graph;
pub mod models;
pub mod pack;
pub mod query;

#[cfg(feature = "python")]
mod python;

#[cfg(test)]
mod fixtures;

pub use config::{load_config, PackConfig};
pub use errors::{PackError, PackResult};
pub use models::{ContextPack, GraphDocument, GraphEdge, GraphNode, PackMetrics, Section};
pub use pack::{pack_graph, pack_graph_at, pack_graph_file};
