//! The evaluation harness: run questions through the pipeline, then score
//! the answers and contexts.

use std::collections::BTreeMap;
use std::sync::Arc;

use docqa_rag::{AnswerPipeline, CompletionModel, EmbeddingProvider, Retriever};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::dataset::{EvalQuestion, EvaluationDataset};
use crate::error::Result;
use crate::metrics::{Metric, MetricScorer};
use crate::report::{ScoreReport, ScoreRow};

/// Where the contexts recorded for each question come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Query the retriever again after answering. The contexts match the
    /// ones the answer used only while retrieval is deterministic.
    #[default]
    Reretrieve,
    /// Record the contexts the answer call itself placed in the prompt.
    FromAnswer,
}

/// Runs evaluation questions through an [`AnswerPipeline`] and scores the
/// results on every [`Metric`].
///
/// # Example
///
/// ```rust,ignore
/// use docqa_eval::{EvalQuestion, RagEvaluator};
///
/// let evaluator = RagEvaluator::new(pipeline, retriever, judge, embeddings);
/// let report = evaluator
///     .run(&[EvalQuestion::new("How is a model created?", "By calling CreateModel.")])
///     .await?;
/// println!("{}", report.to_table());
/// ```
pub struct RagEvaluator {
    pipeline: Arc<AnswerPipeline>,
    retriever: Arc<Retriever>,
    scorer: MetricScorer,
    metrics: Vec<Metric>,
    context_source: ContextSource,
}

impl RagEvaluator {
    /// Create an evaluator scoring all six metrics.
    pub fn new(
        pipeline: Arc<AnswerPipeline>,
        retriever: Arc<Retriever>,
        judge: Arc<dyn CompletionModel>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            pipeline,
            retriever,
            scorer: MetricScorer::new(judge, embeddings),
            metrics: Metric::ALL.to_vec(),
            context_source: ContextSource::default(),
        }
    }

    /// Choose where recorded contexts come from.
    pub fn with_context_source(mut self, source: ContextSource) -> Self {
        self.context_source = source;
        self
    }

    /// Restrict scoring to a subset of metrics, kept in the given order.
    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = Metric>) -> Self {
        self.metrics = metrics.into_iter().collect();
        self
    }

    /// Set how many questions `answer_relevancy` generates per answer.
    pub fn with_strictness(mut self, strictness: usize) -> Self {
        self.scorer = self.scorer.with_strictness(strictness);
        self
    }

    /// Answer every question and record its contexts.
    ///
    /// # Errors
    ///
    /// Propagates pipeline and retrieval errors; returns
    /// [`EvalError::DataError`](crate::EvalError::DataError) for a question
    /// without ground truth.
    pub async fn infer(&self, questions: &[EvalQuestion]) -> Result<EvaluationDataset> {
        let mut texts = Vec::with_capacity(questions.len());
        let mut answers = Vec::with_capacity(questions.len());
        let mut contexts = Vec::with_capacity(questions.len());
        let mut ground_truths = Vec::with_capacity(questions.len());

        for item in questions {
            let (answer, used) = match self.context_source {
                ContextSource::Reretrieve => {
                    let answer = self.pipeline.answer(&item.question).await?;
                    debug!(question = %item.question, "re-retrieving contexts for evaluation");
                    let chunks = self.retriever.retrieve(&item.question).await?;
                    (answer, chunks.into_iter().map(|c| c.text).collect())
                }
                ContextSource::FromAnswer => {
                    let answer = self.pipeline.answer_with_contexts(&item.question).await?;
                    (answer.text, answer.contexts)
                }
            };
            texts.push(item.question.clone());
            answers.push(answer);
            contexts.push(used);
            ground_truths.push(item.ground_truths.clone());
        }

        info!(question_count = questions.len(), source = ?self.context_source, "inferred answers");
        EvaluationDataset::from_columns(texts, answers, contexts, ground_truths)
    }

    /// Score every record on every configured metric.
    ///
    /// # Errors
    ///
    /// The first metric failure aborts the run and is returned unchanged.
    pub async fn evaluate(&self, dataset: &EvaluationDataset) -> Result<ScoreReport> {
        let mut report = ScoreReport::new(self.metrics.clone());
        for record in dataset.records() {
            let mut scores = BTreeMap::new();
            for metric in &self.metrics {
                let score = self.scorer.score(*metric, record).await.inspect_err(|e| {
                    error!(%metric, question = %record.question, error = %e, "metric failed");
                })?;
                scores.insert(*metric, score);
            }
            info!(question = %record.question, "scored question");
            report.push(ScoreRow { question: record.question.clone(), scores });
        }
        Ok(report)
    }

    /// [`infer`](Self::infer) then [`evaluate`](Self::evaluate).
    pub async fn run(&self, questions: &[EvalQuestion]) -> Result<ScoreReport> {
        let dataset = self.infer(questions).await?;
        self.evaluate(&dataset).await
    }
}
