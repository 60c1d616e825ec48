//! Quality metrics for answers and retrieved contexts.
//!
//! Every metric is scored per [`EvalRecord`] by a [`MetricScorer`], which
//! combines a judge [`CompletionModel`] (asked for JSON verdicts) and an
//! [`EmbeddingProvider`] (for semantic similarity). Scores are clamped to
//! `[0, 1]`, higher is better.
//!
//! | Metric                    | Judge | Embeddings |
//! |---------------------------|-------|------------|
//! | `answer_relevancy`        | yes   | yes        |
//! | `answer_similarity`       |       | yes        |
//! | `answer_correctness`      | yes   | yes        |
//! | `context_precision`       | yes   |            |
//! | `context_recall`          | yes   |            |
//! | `context_entity_recall`   | yes   |            |

mod answer;
mod context;
mod judge;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use docqa_rag::{CompletionModel, EmbeddingProvider, cosine_similarity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::EvalRecord;
use crate::error::{EvalError, Result};

/// Number of questions generated from an answer for `answer_relevancy`.
pub const DEFAULT_STRICTNESS: usize = 3;

/// The evaluation metrics, in report column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// How directly the answer addresses the question.
    AnswerRelevancy,
    /// Embedding similarity between the answer and the reference.
    AnswerSimilarity,
    /// Statement-level agreement with the reference, blended with similarity.
    AnswerCorrectness,
    /// Whether useful contexts are ranked above useless ones.
    ContextPrecision,
    /// Share of reference sentences supported by the contexts.
    ContextRecall,
    /// Share of reference entities present in the contexts.
    ContextEntityRecall,
}

impl Metric {
    /// Every metric, in report column order.
    pub const ALL: [Metric; 6] = [
        Metric::AnswerRelevancy,
        Metric::AnswerSimilarity,
        Metric::AnswerCorrectness,
        Metric::ContextPrecision,
        Metric::ContextRecall,
        Metric::ContextEntityRecall,
    ];

    /// The report column name.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::AnswerRelevancy => "answer_relevancy",
            Metric::AnswerSimilarity => "answer_similarity",
            Metric::AnswerCorrectness => "answer_correctness",
            Metric::ContextPrecision => "context_precision",
            Metric::ContextRecall => "context_recall",
            Metric::ContextEntityRecall => "context_entity_recall",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| EvalError::DataError(format!("unknown metric '{s}'")))
    }
}

/// Computes metric scores for single records.
pub struct MetricScorer {
    judge: Arc<dyn CompletionModel>,
    embeddings: Arc<dyn EmbeddingProvider>,
    strictness: usize,
}

impl MetricScorer {
    /// Create a scorer from a judge model and an embedding provider.
    pub fn new(judge: Arc<dyn CompletionModel>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { judge, embeddings, strictness: DEFAULT_STRICTNESS }
    }

    /// Set how many questions `answer_relevancy` asks the judge to generate.
    pub fn with_strictness(mut self, strictness: usize) -> Self {
        self.strictness = strictness.max(1);
        self
    }

    /// Score one record on one metric.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MetricError`] for unusable judge replies and
    /// propagates judge and embedding errors as [`EvalError::Rag`].
    pub async fn score(&self, metric: Metric, record: &EvalRecord) -> Result<f32> {
        let raw = match metric {
            Metric::AnswerRelevancy => self.answer_relevancy(record).await?,
            Metric::AnswerSimilarity => self.answer_similarity(record).await?,
            Metric::AnswerCorrectness => self.answer_correctness(record).await?,
            Metric::ContextPrecision => self.context_precision(record).await?,
            Metric::ContextRecall => self.context_recall(record).await?,
            Metric::ContextEntityRecall => self.context_entity_recall(record).await?,
        };
        let score = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
        debug!(%metric, score, "scored record");
        Ok(score)
    }

    /// Send a prompt to the judge and decode its JSON reply.
    async fn ask<T: DeserializeOwned>(&self, metric: Metric, prompt: &str) -> Result<T> {
        let reply = self.judge.complete(prompt).await?;
        judge::parse_reply(metric, &reply)
    }

    /// Cosine similarity between the embeddings of two texts; 0 if either is blank.
    async fn similarity(&self, a: &str, b: &str) -> Result<f32> {
        if a.trim().is_empty() || b.trim().is_empty() {
            return Ok(0.0);
        }
        let vectors = self.embeddings.embed_batch(&[a, b]).await?;
        match vectors.as_slice() {
            [left, right] => Ok(cosine_similarity(left, right)),
            _ => Err(EvalError::DataError(format!(
                "embedding provider returned {} vectors for 2 texts",
                vectors.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
        assert!("faithfulness".parse::<Metric>().is_err());
    }

    #[test]
    fn serializes_as_column_name() {
        assert_eq!(
            serde_json::to_string(&Metric::ContextEntityRecall).unwrap(),
            "\"context_entity_recall\""
        );
    }
}
