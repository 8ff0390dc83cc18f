use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dom::{NodeGraphBuilder, DEFAULT_CONTEXT_DEPTH, DEFAULT_ID_ATTRIBUTE};
use crate::retriever::{DEFAULT_MODEL, DEFAULT_THRESHOLD, DEFAULT_TOP_K};

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Retrieval settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2", or "lexical" for offline use)
    #[serde(default = "default_model")]
    pub model: String,

    /// Number of results returned by a query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity [-1.0, 1.0]
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Hops walked up and down the node graph when collecting context
    #[serde(default = "default_context_depth")]
    pub context_depth: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
            context_depth: DEFAULT_CONTEXT_DEPTH,
        }
    }
}

/// Markup parsing settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Attribute holding the backend node id
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,

    /// Reject markup the html parser had to repair
    #[serde(default)]
    pub strict: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_string(),
            strict: false,
        }
    }
}

impl ParserConfig {
    pub fn builder(&self) -> NodeGraphBuilder {
        NodeGraphBuilder::new(&self.id_attribute).strict(self.strict)
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_context_depth() -> usize {
    DEFAULT_CONTEXT_DEPTH
}

fn default_id_attribute() -> String {
    DEFAULT_ID_ATTRIBUTE.to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retriever: RetrieverConfig,
    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        let retriever = &self.retriever;
        if retriever.top_k == 0 {
            return Err(ConfigError::Invalid(
                "retriever.top_k must be greater than 0".to_string(),
            ));
        }

        if !(-1.0..=1.0).contains(&retriever.threshold) {
            return Err(ConfigError::Invalid(format!(
                "retriever.threshold must be between -1.0 and 1.0, got {}",
                retriever.threshold
            )));
        }

        if retriever.context_depth == 0 {
            return Err(ConfigError::Invalid(
                "retriever.context_depth must be greater than 0".to_string(),
            ));
        }

        if retriever.model.trim().is_empty() {
            return Err(ConfigError::Invalid("retriever.model is empty".to_string()));
        }

        if self.parser.id_attribute.trim().is_empty() {
            return Err(ConfigError::Invalid("parser.id_attribute is empty".to_string()));
        }

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, creating it with defaults when missing.
    pub fn load_with(base_path: &Path) -> Result<Self, ConfigError> {
        std::fs::create_dir_all(base_path)?;
        let path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !path.exists() {
            log::info!("writing default config to {}", path.display());
            std::fs::write(&path, serde_yml::to_string(&Self::default())?)?;
        }

        let config_str = std::fs::read_to_string(&path)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(self.base_path.join(CONFIG_FILE), config_str)?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
