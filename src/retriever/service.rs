//! Contextual retriever over the interactive nodes of one document.
//!
//! Indexing builds the node graph, collects each interactive node's context
//! and embeds text, context and their average. Querying embeds the query once
//! and ranks nodes by their best matching signal.

use serde::Serialize;

use crate::dom::{DomError, Node, NodeGraph, NodeGraphBuilder, NodeId, DEFAULT_CONTEXT_DEPTH};
use crate::retriever::embeddings::{embed_or_zero, Embedder, EmbeddingError};
use crate::retriever::index::{EmbeddingRecord, IndexError, MatchType, NodeIndex};

/// Errors that can occur during indexing or querying.
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    #[error("Parse error: {0}")]
    Parse(#[from] DomError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// A node ranked against a query.
#[derive(Debug, Clone)]
pub struct RankedNode<'a> {
    pub node: &'a Node,
    pub score: f32,
    pub match_type: MatchType,
}

/// Serializable query result.
#[derive(Debug, Clone, Serialize)]
pub struct QueryHit {
    pub node_id: NodeId,
    pub node_tag: String,
    pub node_text: String,
    pub score: f32,
    pub match_type: MatchType,
    pub context: String,
}

/// Counts reported after indexing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub nodes: usize,
    pub interactive: usize,
}

/// Retriever owning one document's node graph and embedding index.
///
/// Indexing takes `&mut self` and querying `&self`, so a query can never
/// observe a half-built index.
pub struct ContextualRetriever<E> {
    embedder: E,
    builder: NodeGraphBuilder,
    context_depth: usize,
    graph: NodeGraph,
    index: NodeIndex,
}

impl<E: Embedder> ContextualRetriever<E> {
    pub fn new(embedder: E) -> Self {
        let dimensions = embedder.dimensions();
        Self {
            embedder,
            builder: NodeGraphBuilder::default(),
            context_depth: DEFAULT_CONTEXT_DEPTH,
            graph: NodeGraph::default(),
            index: NodeIndex::new(dimensions),
        }
    }

    pub fn with_builder(mut self, builder: NodeGraphBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_context_depth(mut self, context_depth: usize) -> Self {
        self.context_depth = context_depth;
        self
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn indexed_count(&self) -> usize {
        self.index.len()
    }

    /// Parse `markup` and index it, replacing any previous document.
    pub fn index(&mut self, markup: &str) -> Result<IndexStats, RetrieverError> {
        let graph = self.builder.build(markup)?;
        self.index_graph(graph)
    }

    /// Index an already built graph, replacing any previous document.
    ///
    /// The new index is built aside; on any embedding failure the previous
    /// graph and index stay in place.
    pub fn index_graph(&mut self, graph: NodeGraph) -> Result<IndexStats, RetrieverError> {
        let interactive = graph.interactive();
        let mut index = NodeIndex::with_capacity(self.embedder.dimensions(), interactive.len());

        for node in &interactive {
            let context = graph.context(&node.id, self.context_depth);
            let text_embedding = embed_or_zero(&self.embedder, &node.text_content)?;
            let context_embedding = embed_or_zero(&self.embedder, &context)?;

            index.insert(
                node.id.clone(),
                EmbeddingRecord::new(
                    node.text_content.clone(),
                    context,
                    text_embedding,
                    context_embedding,
                ),
            )?;
        }

        let stats = IndexStats {
            nodes: graph.len(),
            interactive: interactive.len(),
        };
        log::info!(
            "indexed {} interactive node(s) out of {} with {}",
            stats.interactive,
            stats.nodes,
            self.embedder.name()
        );

        self.graph = graph;
        self.index = index;

        Ok(stats)
    }

    /// Rank indexed nodes against `text`.
    ///
    /// `top_k` must be at least 1 and `threshold` within [-1, 1].
    pub fn query(
        &self,
        text: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<RankedNode<'_>>, RetrieverError> {
        if top_k == 0 {
            return Err(RetrieverError::InvalidQuery(
                "top_k must be a positive integer".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(RetrieverError::InvalidQuery(format!(
                "threshold must be between -1.0 and 1.0, got {threshold}"
            )));
        }

        if self.index.is_empty() {
            log::debug!("query against empty index");
            return Ok(vec![]);
        }

        let query_embedding = embed_or_zero(&self.embedder, text)?;
        let scored = self.index.search(&query_embedding, threshold, top_k)?;

        Ok(scored
            .into_iter()
            .filter_map(|hit| {
                self.graph.get(&hit.id).map(|node| RankedNode {
                    node,
                    score: hit.score,
                    match_type: hit.match_type,
                })
            })
            .collect())
    }

    /// Same as [`query`](Self::query), flattened into serializable hits.
    pub fn hits(
        &self,
        text: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<QueryHit>, RetrieverError> {
        Ok(self
            .query(text, top_k, threshold)?
            .into_iter()
            .map(|ranked| QueryHit {
                node_id: ranked.node.id.clone(),
                node_tag: ranked.node.tag.clone(),
                node_text: ranked.node.text_content.clone(),
                score: ranked.score,
                match_type: ranked.match_type,
                context: self.context_for_node(&ranked.node.id).to_string(),
            })
            .collect())
    }

    /// Context stored for `id` at indexing time, empty when not indexed.
    pub fn context_for_node(&self, id: &NodeId) -> &str {
        self.index
            .get(id)
            .map(|record| record.context.as_str())
            .unwrap_or_default()
    }
}
