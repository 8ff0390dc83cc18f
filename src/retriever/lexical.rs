//! Offline lexical embedder.
//!
//! Feature-hashes query and node terms into a fixed number of buckets so the
//! retriever works without downloading a model. Two texts with the same terms
//! map to the same direction; unrelated texts are orthogonal unless two terms
//! share a bucket.

use crate::retriever::embeddings::{Embedder, EmbeddingError};

/// Model name selecting the lexical embedder.
pub const LEXICAL_MODEL: &str = "lexical";

/// Default number of hash buckets
pub const DEFAULT_LEXICAL_DIMENSIONS: usize = 256;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being",
    "in", "on", "at", "to", "for", "of", "with", "by", "from", "as",
    "and", "or", "but", "not", "no", "so", "if", "then",
];

#[derive(Debug, Clone)]
pub struct LexicalEmbedder {
    dimensions: usize,
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_LEXICAL_DIMENSIONS)
    }
}

impl LexicalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Embedder for LexicalEmbedder {
    fn name(&self) -> &str {
        LEXICAL_MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimensions];

        for term in tokenize(text) {
            let bucket = crc32fast::hash(term.as_bytes()) as usize % self.dimensions;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            vector.iter_mut().for_each(|x| *x /= norm);
        }

        Ok(vector)
    }
}

/// Tokenize text into lowercase terms.
/// Filters out very short terms (1 char) and common stop words.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|s| s.to_lowercase())
        .filter(|s| s.chars().count() > 1 && !STOP_WORDS.contains(&s.as_str()))
        .collect()
}
