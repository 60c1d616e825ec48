//! # docqa-eval
//!
//! Offline evaluation harness for the `docqa-rag` answer pipeline.
//!
//! The harness answers a list of [`EvalQuestion`]s, records the retrieved
//! contexts, and scores each record on six LLM-judged and embedding-based
//! [`Metric`]s. Results come back as a [`ScoreReport`] that can be printed
//! as a table, saved as JSON, or rendered as a [`Heatmap`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_eval::{EvalQuestion, Heatmap, RagEvaluator};
//!
//! let evaluator = RagEvaluator::new(pipeline, retriever, judge, embeddings);
//! let questions = EvalQuestion::load_all("questions.json")?;
//! let report = evaluator.run(&questions).await?;
//! println!("{}", report.to_table());
//! Heatmap::from_report(&report).save("scores.svg")?;
//! ```

pub mod dataset;
pub mod error;
pub mod harness;
pub mod heatmap;
pub mod metrics;
pub mod report;

pub use dataset::{EvalQuestion, EvalRecord, EvaluationDataset};
pub use error::{EvalError, Result};
pub use harness::{ContextSource, RagEvaluator};
pub use heatmap::Heatmap;
pub use metrics::{DEFAULT_STRICTNESS, Metric, MetricScorer};
pub use report::{ScoreReport, ScoreRow};
