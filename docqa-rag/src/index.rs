//! In-memory vector index.
//!
//! [`VectorIndex`] is a write-once set of `(Chunk, embedding)` entries with
//! brute-force nearest-neighbour search. It is rebuilt from scratch for every
//! retriever and never persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// Distance metric used to rank index entries against a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine_similarity`; zero vectors have similarity 0.
    #[default]
    Cosine,
    /// Euclidean distance.
    L2,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length under this metric.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => 1.0 - cosine_similarity(a, b),
            Self::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt(),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => f.write_str("cosine"),
            Self::L2 => f.write_str("l2"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "l2" | "euclidean" => Ok(Self::L2),
            other => Err(RagError::ConfigError(format!("unknown distance metric '{other}'"))),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A write-once in-memory similarity index.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{DistanceMetric, VectorIndex};
///
/// let index = VectorIndex::build(entries, DistanceMetric::Cosine)?;
/// let nearest = index.search(&query_embedding, 3);
/// ```
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
    metric: DistanceMetric,
    dimensions: usize,
}

impl VectorIndex {
    /// Build an index from `(chunk, embedding)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ServiceError`] if the embeddings do not all share
    /// one dimensionality, which means the provider returned malformed data.
    pub fn build(entries: Vec<(Chunk, Vec<f32>)>, metric: DistanceMetric) -> Result<Self> {
        let dimensions = entries.first().map_or(0, |(_, v)| v.len());
        if let Some((chunk, vector)) = entries.iter().find(|(_, v)| v.len() != dimensions) {
            error!(chunk.id = %chunk.id, expected = dimensions, actual = vector.len(), "embedding dimension mismatch");
            return Err(RagError::ServiceError {
                provider: "index".to_string(),
                message: format!(
                    "embedding for chunk '{}' has {} dimensions, expected {dimensions}",
                    chunk.id,
                    vector.len()
                ),
            });
        }
        debug!(entry_count = entries.len(), dimensions, %metric, "built vector index");
        Ok(Self { entries, metric, dimensions })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality of the indexed vectors (0 for an empty index).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The configured distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Iterate over the indexed chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|(chunk, _)| chunk)
    }

    /// Return the `top_k` entries nearest to `embedding`, nearest first.
    ///
    /// Returns every entry when the index holds fewer than `top_k`. Ordering
    /// among equal distances is unspecified.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(chunk, vector)| SearchResult {
                chunk: chunk.clone(),
                distance: self.metric.distance(vector, embedding),
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(top_k);
        scored
    }
}
