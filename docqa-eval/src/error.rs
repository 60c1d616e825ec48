//! Error types for the `docqa-eval` crate.

use std::path::PathBuf;

use docqa_rag::RagError;
use thiserror::Error;

use crate::metrics::Metric;

/// Errors that can occur while building datasets, scoring, or rendering.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Malformed or inconsistent evaluation data.
    #[error("Data error: {0}")]
    DataError(String),

    /// A metric could not be computed, usually because the judge reply was unusable.
    #[error("Metric error ({metric}): {message}")]
    MetricError {
        /// The metric that failed.
        metric: Metric,
        /// A description of the failure.
        message: String,
    },

    /// The heatmap could not be rendered or encoded.
    #[error("Render error: {0}")]
    RenderError(String),

    /// A question file, report, or image could not be read or written.
    #[error("I/O error at {}: {source}", path.display())]
    IoError {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A pipeline, retrieval, or provider error.
    #[error(transparent)]
    Rag(#[from] RagError),
}

impl EvalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError { path: path.into(), source }
    }

    pub(crate) fn metric(metric: Metric, message: impl Into<String>) -> Self {
        Self::MetricError { metric, message: message.into() }
    }
}

/// A convenience result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
