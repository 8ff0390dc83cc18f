//! Backend node graph built from HTML markup.
//!
//! - `node`: the `Node` record and the interactivity heuristic
//! - `builder`: walks the parsed element tree and materializes identified elements
//! - `graph`: the node mapping and bounded-depth context extraction

mod builder;
mod graph;
mod node;

pub use builder::{NodeGraphBuilder, DEFAULT_ID_ATTRIBUTE};
pub use graph::{NodeGraph, RagEntry, DEFAULT_CONTEXT_DEPTH};
pub use node::{is_interactive, normalize_whitespace, Node, NodeId};

/// Errors surfaced while turning markup into a node graph.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Failed to parse markup: {0}")]
    ParseFailure(String),
}
