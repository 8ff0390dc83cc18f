//! Embedding capability used by the retriever.
//!
//! - `Embedder`: the seam between the retriever and any embedding model
//! - `EmbeddingModel`: fastembed-backed ONNX model with lazy download
//! - `Backend`: runtime choice between fastembed and the lexical embedder

#[cfg(feature = "fastembed")]
use fastembed::{InitOptions, TextEmbedding};
#[cfg(feature = "fastembed")]
use std::sync::Mutex;
use std::path::PathBuf;

use crate::retriever::lexical::{LexicalEmbedder, LEXICAL_MODEL};

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),
}

/// Anything that turns text into a fixed-length vector.
///
/// Implementations must be deterministic for identical input and keep
/// `dimensions()` fixed for their whole lifetime.
pub trait Embedder {
    fn name(&self) -> &str;
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }
}

/// Embed `text`, mapping empty or whitespace-only input to the zero vector
/// without calling the model.
pub fn embed_or_zero<E: Embedder + ?Sized>(
    embedder: &E,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    if text.trim().is_empty() {
        return Ok(vec![0.0; embedder.dimensions()]);
    }
    embedder.embed(text)
}

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
#[cfg(feature = "fastembed")]
pub struct EmbeddingModel {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

#[cfg(feature = "fastembed")]
impl EmbeddingModel {
    /// Load the named model, downloading it into `cache_dir/models` on first use.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let model_enum = Self::parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        let dimensions = Self::probe_dimensions(&mut model)?;
        log::info!("loaded embedding model {model_name} ({dimensions} dimensions)");

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    /// Parse model name string to fastembed enum.
    fn parse_model_name(
        name: &str,
    ) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
        match name.to_lowercase().as_str() {
            "all-minilm-l6-v2" | "allminiml6v2" => {
                Ok(fastembed::EmbeddingModel::AllMiniLML6V2)
            }
            "all-minilm-l6-v2-q" | "allminiml6v2q" => {
                Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q)
            }
            "bge-small-en-v1.5" | "bgesmallenv15" => {
                Ok(fastembed::EmbeddingModel::BGESmallENV15)
            }
            "bge-small-en-v1.5-q" | "bgesmallenv15q" => {
                Ok(fastembed::EmbeddingModel::BGESmallENV15Q)
            }
            "bge-base-en-v1.5" | "bgebaseenv15" => {
                Ok(fastembed::EmbeddingModel::BGEBaseENV15)
            }
            "bge-base-en-v1.5-q" | "bgebaseenv15q" => {
                Ok(fastembed::EmbeddingModel::BGEBaseENV15Q)
            }
            "bge-large-en-v1.5" | "bgelargeenv15" => {
                Ok(fastembed::EmbeddingModel::BGELargeENV15)
            }
            "bge-large-en-v1.5-q" | "bgelargeenv15q" => {
                Ok(fastembed::EmbeddingModel::BGELargeENV15Q)
            }
            _ => Err(EmbeddingError::InvalidModel(format!(
                "Unknown model: {}. Supported models: {}, all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5 (add -q suffix for quantized)",
                name, LEXICAL_MODEL
            ))),
        }
    }

    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
        let test_embeddings = model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::InitFailed(format!("Failed to probe dimensions: {}", e)))?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::InitFailed("Model returned no embedding".to_string()))
    }
}

#[cfg(feature = "fastembed")]
impl Embedder for EmbeddingModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut model = self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))
    }
}

/// Embedding backend selected by model name at runtime.
pub enum Backend {
    #[cfg(feature = "fastembed")]
    Model(EmbeddingModel),
    Lexical(LexicalEmbedder),
}

impl Backend {
    /// Resolve `model_name` to a backend. `lexical` never touches the network.
    pub fn load(model_name: &str, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        if model_name.eq_ignore_ascii_case(LEXICAL_MODEL) {
            return Ok(Backend::Lexical(LexicalEmbedder::default()));
        }

        #[cfg(feature = "fastembed")]
        {
            EmbeddingModel::new(model_name, cache_dir).map(Backend::Model)
        }

        #[cfg(not(feature = "fastembed"))]
        {
            let _ = cache_dir;
            Err(EmbeddingError::InvalidModel(format!(
                "{model_name} requires the `fastembed` feature, only `{LEXICAL_MODEL}` is available"
            )))
        }
    }
}

impl Embedder for Backend {
    fn name(&self) -> &str {
        match self {
            #[cfg(feature = "fastembed")]
            Backend::Model(model) => model.name(),
            Backend::Lexical(lexical) => lexical.name(),
        }
    }

    fn dimensions(&self) -> usize {
        match self {
            #[cfg(feature = "fastembed")]
            Backend::Model(model) => model.dimensions(),
            Backend::Lexical(lexical) => lexical.dimensions(),
        }
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            #[cfg(feature = "fastembed")]
            Backend::Model(model) => model.embed(text),
            Backend::Lexical(lexical) => lexical.embed(text),
        }
    }
}
