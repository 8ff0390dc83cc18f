//! In-memory embedding index with cosine similarity search.
//!
//! Stores three vectors per interactive node (text, context, combined) and
//! scores every node against a query by its best matching signal.

use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Which stored signal produced a node's score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Text,
    Context,
    Combined,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Text => "text",
            MatchType::Context => "context",
            MatchType::Combined => "combined",
        }
    }
}

impl Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embeddings and source strings for one interactive node.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub text_embedding: Vec<f32>,
    pub context_embedding: Vec<f32>,
    /// Elementwise average of the text and context embeddings
    pub combined_embedding: Vec<f32>,
    pub text: String,
    pub context: String,
}

impl EmbeddingRecord {
    pub fn new(
        text: String,
        context: String,
        text_embedding: Vec<f32>,
        context_embedding: Vec<f32>,
    ) -> Self {
        let combined_embedding = average(&text_embedding, &context_embedding);
        Self {
            text_embedding,
            context_embedding,
            combined_embedding,
            text,
            context,
        }
    }
}

/// One scored node, before it is joined back to the node graph.
#[derive(Debug, Clone)]
pub struct ScoredNode {
    pub id: NodeId,
    pub score: f32,
    pub match_type: MatchType,
}

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Embedding records keyed by node id.
#[derive(Debug, Default)]
pub struct NodeIndex {
    records: HashMap<NodeId, EmbeddingRecord>,
    dimensions: usize,
}

impl NodeIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            records: HashMap::new(),
            dimensions,
        }
    }

    pub fn with_capacity(dimensions: usize, capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
            dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &NodeId) -> Option<&EmbeddingRecord> {
        self.records.get(id)
    }

    /// Insert or replace the record for `id`.
    pub fn insert(&mut self, id: NodeId, record: EmbeddingRecord) -> Result<(), IndexError> {
        for vector in [&record.text_embedding, &record.context_embedding] {
            self.check_dimensions(vector)?;
        }
        self.records.insert(id, record);
        Ok(())
    }

    /// Score every record against `query`.
    ///
    /// Each node keeps its best signal (ties prefer text, then context, then
    /// combined). Nodes below `threshold` are dropped. Results are sorted by
    /// score descending, then by node id, and cut to `limit`.
    pub fn search(
        &self,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredNode>, IndexError> {
        self.check_dimensions(query)?;

        let mut results: Vec<ScoredNode> = self
            .records
            .iter()
            .filter_map(|(id, record)| {
                let (score, match_type) = best_signal(
                    cosine_similarity(query, &record.text_embedding),
                    cosine_similarity(query, &record.context_embedding),
                    cosine_similarity(query, &record.combined_embedding),
                );
                if score >= threshold {
                    Some(ScoredNode {
                        id: id.clone(),
                        score,
                        match_type,
                    })
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        results.truncate(limit);

        Ok(results)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        Ok(())
    }
}

/// Pick the best of the three signal scores.
fn best_signal(text: f32, context: f32, combined: f32) -> (f32, MatchType) {
    if text >= context && text >= combined {
        (text, MatchType::Text)
    } else if context >= combined {
        (context, MatchType::Context)
    } else {
        (combined, MatchType::Combined)
    }
}

/// Compute L2 norm of a vector.
fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity in [-1, 1]. A zero-norm side scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let a_norm = l2_norm(a);
    let b_norm = l2_norm(b);
    if a_norm < f32::EPSILON || b_norm < f32::EPSILON {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    (dot_product / (a_norm * b_norm)).clamp(-1.0, 1.0)
}

/// Elementwise average of two vectors of equal length.
pub fn average(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b.iter()).map(|(x, y)| (x + y) / 2.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: Vec<f32>, context: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord::new(String::new(), String::new(), text, context)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a = [0.3, -0.2, 0.9];
        let b = [0.1, 0.4, 0.2];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[1.0, 0.0], &[0.0, 1.0]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_best_signal_tie_order() {
        assert_eq!(best_signal(0.5, 0.5, 0.5).1, MatchType::Text);
        assert_eq!(best_signal(0.1, 0.5, 0.5).1, MatchType::Context);
        assert_eq!(best_signal(0.1, 0.2, 0.5).1, MatchType::Combined);
        assert_eq!(best_signal(0.5, 0.4, 0.6), (0.6, MatchType::Combined));
    }

    #[test]
    fn test_insert_dimension_mismatch() {
        let mut index = NodeIndex::new(3);
        let result = index.insert("1".into(), record(vec![1.0, 0.0], vec![1.0, 0.0]));
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_search_picks_context_signal() {
        let mut index = NodeIndex::new(2);
        index
            .insert("1".into(), record(vec![0.0, 1.0], vec![1.0, 0.0]))
            .unwrap();

        let results = index.search(&[1.0, 0.0], 0.0, 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type, MatchType::Context);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_threshold_limit_and_ties() {
        let mut index = NodeIndex::new(2);
        index.insert("b".into(), record(vec![1.0, 0.0], vec![0.0, 0.0])).unwrap();
        index.insert("a".into(), record(vec![1.0, 0.0], vec![0.0, 0.0])).unwrap();
        index.insert("c".into(), record(vec![1.0, 1.0], vec![0.0, 0.0])).unwrap();
        index.insert("d".into(), record(vec![0.0, 1.0], vec![0.0, 0.0])).unwrap();

        let results = index.search(&[1.0, 0.0], 0.5, 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let results = index.search(&[1.0, 0.0], 0.5, 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_str(), "a");
    }

    #[test]
    fn test_match_type_display_matches_serde() {
        for match_type in [MatchType::Text, MatchType::Context, MatchType::Combined] {
            let json = serde_json::to_string(&match_type).unwrap();
            assert_eq!(json, format!("\"{match_type}\""));
        }
        assert_eq!(MatchType::Context.to_string(), "context");
    }

    #[test]
    fn test_search_query_dimension_mismatch() {
        let index = NodeIndex::new(3);
        assert!(index.search(&[1.0], 0.0, 5).is_err());
    }
}
