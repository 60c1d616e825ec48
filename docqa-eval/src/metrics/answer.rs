//! Answer-side metrics: relevancy, similarity, and correctness.

use docqa_rag::cosine_similarity;
use serde::Deserialize;
use tracing::debug;

use super::judge::{ANSWER_CORRECTNESS_PROMPT, ANSWER_RELEVANCY_PROMPT, flag, render};
use super::{Metric, MetricScorer};
use crate::dataset::EvalRecord;
use crate::error::{EvalError, Result};

/// Weight of the statement F1 in `answer_correctness`; the rest is similarity.
const CORRECTNESS_F1_WEIGHT: f32 = 0.75;

#[derive(Debug, Deserialize)]
struct GeneratedQuestions {
    #[serde(default)]
    questions: Vec<String>,
    #[serde(deserialize_with = "flag")]
    noncommittal: bool,
}

#[derive(Debug, Deserialize)]
struct StatementClasses {
    #[serde(rename = "TP", default)]
    true_positives: Vec<String>,
    #[serde(rename = "FP", default)]
    false_positives: Vec<String>,
    #[serde(rename = "FN", default)]
    false_negatives: Vec<String>,
}

impl StatementClasses {
    /// `TP / (TP + (FP + FN) / 2)`, or 0 with no true positives.
    fn f1(&self) -> f32 {
        let tp = self.true_positives.len() as f32;
        if tp == 0.0 {
            return 0.0;
        }
        let fp = self.false_positives.len() as f32;
        let fn_ = self.false_negatives.len() as f32;
        tp / (tp + 0.5 * (fp + fn_))
    }
}

impl MetricScorer {
    /// Mean similarity between the question and questions regenerated from
    /// the answer; 0 for a noncommittal answer.
    pub(super) async fn answer_relevancy(&self, record: &EvalRecord) -> Result<f32> {
        let metric = Metric::AnswerRelevancy;
        if record.answer.trim().is_empty() {
            return Ok(0.0);
        }

        let count = self.strictness.to_string();
        let prompt = render(ANSWER_RELEVANCY_PROMPT, &[
            ("count", count.as_str()),
            ("answer", record.answer.as_str()),
        ])?;
        let reply: GeneratedQuestions = self.ask(metric, &prompt).await?;
        if reply.noncommittal {
            debug!(%metric, "answer judged noncommittal");
            return Ok(0.0);
        }

        let generated: Vec<&str> =
            reply.questions.iter().map(|q| q.trim()).filter(|q| !q.is_empty()).collect();
        if generated.is_empty() {
            return Err(EvalError::metric(metric, "judge generated no questions"));
        }

        let question = self.embeddings.embed(&record.question).await?;
        let vectors = self.embeddings.embed_batch(&generated).await?;
        if vectors.len() != generated.len() {
            return Err(EvalError::DataError(format!(
                "embedding provider returned {} vectors for {} questions",
                vectors.len(),
                generated.len()
            )));
        }
        let total: f32 = vectors.iter().map(|v| cosine_similarity(&question, v)).sum();
        Ok(total / vectors.len() as f32)
    }

    /// Cosine similarity between the answer and the reference.
    pub(super) async fn answer_similarity(&self, record: &EvalRecord) -> Result<f32> {
        self.similarity(&record.answer, &record.reference()).await
    }

    /// Weighted blend of statement-level F1 against the reference and
    /// [`answer_similarity`](Self::answer_similarity).
    pub(super) async fn answer_correctness(&self, record: &EvalRecord) -> Result<f32> {
        let metric = Metric::AnswerCorrectness;
        let reference = record.reference();
        let prompt = render(ANSWER_CORRECTNESS_PROMPT, &[
            ("question", record.question.as_str()),
            ("answer", record.answer.as_str()),
            ("ground_truth", reference.as_str()),
        ])?;
        let classes: StatementClasses = self.ask(metric, &prompt).await?;
        let f1 = classes.f1();
        debug!(
            %metric,
            tp = classes.true_positives.len(),
            fp = classes.false_positives.len(),
            fn_ = classes.false_negatives.len(),
            f1,
            "classified statements"
        );

        let similarity = self.similarity(&record.answer, &reference).await?;
        Ok(CORRECTNESS_F1_WEIGHT * f1 + (1.0 - CORRECTNESS_F1_WEIGHT) * similarity)
    }
}
