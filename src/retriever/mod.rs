//! Contextual retrieval over interactive nodes.
//!
//! # Architecture
//!
//! - `embeddings`: the `Embedder` seam, fastembed wrapper and backend selection
//! - `lexical`: offline feature-hashing embedder
//! - `index`: in-memory text/context/combined vectors with cosine scoring
//! - `service`: indexing and ranked queries over one document

pub mod embeddings;
mod index;
pub mod lexical;
mod service;

#[cfg(feature = "fastembed")]
pub use embeddings::EmbeddingModel;
pub use embeddings::{embed_or_zero, Backend, Embedder, EmbeddingError};
pub use index::{cosine_similarity, EmbeddingRecord, IndexError, MatchType};
pub use lexical::{LexicalEmbedder, LEXICAL_MODEL};
pub use service::{ContextualRetriever, IndexStats, QueryHit, RankedNode, RetrieverError};

/// Default embedding model name
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Default number of results returned by a query
pub const DEFAULT_TOP_K: usize = 5;

/// Default minimum similarity for a node to be returned
pub const DEFAULT_THRESHOLD: f32 = 0.3;
