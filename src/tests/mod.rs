mod retriever;

use crate::retriever::{Embedder, EmbeddingError};

/// Bag-of-words embedder over a fixed vocabulary. Words outside the
/// vocabulary are ignored, so overlaps between texts are exact.
pub struct VocabEmbedder {
    vocab: Vec<&'static str>,
}

impl VocabEmbedder {
    pub fn new(vocab: &[&'static str]) -> Self {
        Self {
            vocab: vocab.to_vec(),
        }
    }
}

impl Embedder for VocabEmbedder {
    fn name(&self) -> &str {
        "vocab"
    }

    fn dimensions(&self) -> usize {
        self.vocab.len()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0; self.vocab.len()];
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            if let Some(pos) = self.vocab.iter().position(|v| *v == word) {
                vector[pos] += 1.0;
            }
        }
        Ok(vector)
    }
}

/// Fails on any text containing `trigger`, otherwise delegates.
pub struct FailingEmbedder {
    pub inner: VocabEmbedder,
    pub trigger: &'static str,
}

impl Embedder for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.contains(self.trigger) {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "refusing to embed `{text}`"
            )));
        }
        self.inner.embed(text)
    }
}
