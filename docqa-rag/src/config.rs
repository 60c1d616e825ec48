//! Configuration for the retrieval and answer pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingBackend;
use crate::error::{RagError, Result};
use crate::index::DistanceMetric;

/// Default corpus directory.
pub const DEFAULT_BASE_PATH: &str = "./sagemaker_documentation/sagemaker_documentation/";

/// Default chat-completion model.
pub const DEFAULT_MODEL_NAME: &str = "gpt-3.5-turbo";

/// Default embedding model for the OpenAI backend.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration parameters for the pipeline.
///
/// Construct a validated value with [`RagConfig::builder()`]. The value is
/// passed explicitly into every component constructor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Directory holding the Markdown corpus.
    pub base_path: PathBuf,
    /// File-name glob selecting corpus files.
    pub glob: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Chat-completion model identifier.
    pub model_name: String,
    /// Embedding backend used to index and query the corpus.
    pub embedding_backend: EmbeddingBackend,
    /// Embedding model identifier for the selected backend.
    pub embedding_model: String,
    /// Sampling temperature for completions.
    pub temperature: f32,
    /// Number of chunks returned per query.
    pub k_items: usize,
    /// Distance metric of the vector index.
    pub distance_metric: DistanceMetric,
    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            glob: "*.md".to_string(),
            chunk_size: 500,
            chunk_overlap: 100,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            embedding_backend: EmbeddingBackend::OpenAi,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.0,
            k_items: 1,
            distance_metric: DistanceMetric::default(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
///
/// When no embedding backend is set explicitly, it is derived from the
/// model name during [`build()`](RagConfigBuilder::build).
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
    embedding_backend: Option<EmbeddingBackend>,
}

impl RagConfigBuilder {
    /// Set the corpus directory.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_path = path.into();
        self
    }

    /// Set the file-name glob (e.g. `*.md` or `**/*.md`).
    pub fn glob(mut self, glob: impl Into<String>) -> Self {
        self.config.glob = glob.into();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the chat-completion model name.
    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.config.model_name = name.into();
        self
    }

    /// Select the embedding backend explicitly.
    pub fn embedding_backend(mut self, backend: EmbeddingBackend) -> Self {
        self.embedding_backend = Some(backend);
        self
    }

    /// Set the embedding model name.
    pub fn embedding_model(mut self, name: impl Into<String>) -> Self {
        self.config.embedding_model = name.into();
        self
    }

    /// Set the completion temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the number of chunks returned per query.
    pub fn k_items(mut self, k: usize) -> Self {
        self.config.k_items = k;
        self
    }

    /// Set the vector index distance metric.
    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.config.distance_metric = metric;
        self
    }

    /// Set the OpenAI-compatible API base URL.
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.openai_base_url = url.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `k_items == 0`
    /// - `temperature` is outside `0.0..=2.0`
    /// - `glob` is empty
    /// - no embedding backend was set and none can be derived from `model_name`
    pub fn build(self) -> Result<RagConfig> {
        let mut config = self.config;
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.k_items == 0 {
            return Err(RagError::ConfigError("k_items must be greater than zero".to_string()));
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be within 0.0..=2.0",
                config.temperature
            )));
        }
        if config.glob.trim().is_empty() {
            return Err(RagError::ConfigError("glob must not be empty".to_string()));
        }
        config.embedding_backend = match self.embedding_backend {
            Some(backend) => backend,
            None => EmbeddingBackend::for_model(&config.model_name)?,
        };
        Ok(config)
    }
}
