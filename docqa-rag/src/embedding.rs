//! Embedding provider trait and backend selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, one per input
    /// and in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// The embedding backends this crate can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingBackend {
    /// The OpenAI `/embeddings` API.
    #[serde(rename = "openai")]
    OpenAi,
}

impl EmbeddingBackend {
    /// Derive the backend from a chat model name.
    ///
    /// Models prefixed `gpt` select [`EmbeddingBackend::OpenAi`]. There is no
    /// fallback for other families.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for any other model name.
    pub fn for_model(model_name: &str) -> Result<Self> {
        if model_name.starts_with("gpt") {
            Ok(Self::OpenAi)
        } else {
            Err(RagError::ConfigError(format!(
                "no embedding backend for model '{model_name}'; set one explicitly"
            )))
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            other => Err(RagError::ConfigError(format!("unknown embedding backend '{other}'"))),
        }
    }
}

/// Construct the embedding provider selected by `config.embedding_backend`.
///
/// # Errors
///
/// Returns [`RagError::AuthError`] if the backend credential is missing and
/// [`RagError::ConfigError`] if the backend was compiled out.
pub fn build_embedding_provider(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding_backend {
        #[cfg(feature = "openai")]
        EmbeddingBackend::OpenAi => {
            let provider = crate::openai::OpenAIEmbeddingProvider::from_env()?
                .with_base_url(&config.openai_base_url)
                .with_model(&config.embedding_model);
            Ok(Arc::new(provider))
        }
        #[cfg(not(feature = "openai"))]
        EmbeddingBackend::OpenAi => Err(RagError::ConfigError(
            "the `openai` feature is disabled in this build".to_string(),
        )),
    }
}
