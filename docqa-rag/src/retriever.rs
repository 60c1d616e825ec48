//! Retriever facade.
//!
//! The [`Retriever`] owns the full ingest path (load → chunk → embed → index)
//! and answers "top-k chunks for this query". The index is built once and
//! only read afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RagConfig, Retriever, build_embedding_provider};
//!
//! let config = RagConfig::builder().base_path("./docs").k_items(3).build()?;
//! let provider = build_embedding_provider(&config)?;
//! let retriever = Retriever::from_config(&config, provider).await?;
//! let chunks = retriever.retrieve("How is a model created?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{DistanceMetric, VectorIndex};
use crate::loader::DocumentLoader;

/// A retrieval handle over a write-once [`VectorIndex`], bound to a fixed `k`.
pub struct Retriever {
    index: VectorIndex,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    /// Load, chunk, embed, and index the corpus described by `config`.
    ///
    /// # Errors
    ///
    /// Propagates loader ([`RagError::IoError`]), chunker
    /// ([`RagError::ConfigError`]), and embedding errors unchanged.
    pub async fn from_config(
        config: &RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let documents = DocumentLoader::from_config(config)?.load()?;
        let chunks = RecursiveChunker::from_config(config)?.chunk_all(&documents);
        info!(
            document_count = documents.len(),
            chunk_count = chunks.len(),
            "split corpus into chunks"
        );
        Self::build(chunks, embedding_provider, config.k_items, config.distance_metric).await
    }

    /// Embed every chunk and build a fresh index over them.
    ///
    /// All chunk texts go to the provider in one batch call; any failure
    /// aborts the whole build.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k == 0`,
    /// [`RagError::ServiceError`] if the provider returns the wrong number of
    /// vectors or vectors of mixed dimensions, and propagates provider
    /// errors unchanged.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        top_k: usize,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(RagError::ConfigError("k must be greater than zero".to_string()));
        }

        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
                error!(chunk_count = chunks.len(), error = %e, "embedding failed during index build");
            })?
        };

        if embeddings.len() != chunks.len() {
            error!(expected = chunks.len(), actual = embeddings.len(), "embedding count mismatch");
            return Err(RagError::ServiceError {
                provider: "embedding".to_string(),
                message: format!(
                    "provider returned {} embeddings for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        let index = VectorIndex::build(chunks.into_iter().zip(embeddings).collect(), metric)?;
        info!(chunk_count = index.len(), top_k, "built retriever");

        Ok(Self { index, embedding_provider, top_k })
    }

    /// The number of chunks returned per query.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The underlying index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Return the `k` nearest chunks with their distances, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ServiceError`] if the query embedding's length
    /// differs from the indexed vectors, and propagates query embedding
    /// errors unchanged.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        if !self.index.is_empty() && query_embedding.len() != self.index.dimensions() {
            error!(
                expected = self.index.dimensions(),
                actual = query_embedding.len(),
                "query embedding dimension mismatch"
            );
            return Err(RagError::service(
                "embedding",
                format!(
                    "query embedding has {} dimensions, index has {}",
                    query_embedding.len(),
                    self.index.dimensions()
                ),
            ));
        }

        let results = self.index.search(&query_embedding, self.top_k);
        info!(result_count = results.len(), "query completed");
        Ok(results)
    }

    /// Return the `k` nearest chunks, nearest first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        Ok(self.search(query).await?.into_iter().map(|r| r.chunk).collect())
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("chunk_count", &self.index.len())
            .field("metric", &self.index.metric())
            .field("top_k", &self.top_k)
            .finish()
    }
}
