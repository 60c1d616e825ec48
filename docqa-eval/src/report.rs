//! Score reports.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EvalError, Result};
use crate::metrics::Metric;

/// Longest question shown in the text table before truncation.
const QUESTION_WIDTH: usize = 48;

/// Scores for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    /// The question text.
    pub question: String,
    /// Score per metric, each in `[0, 1]`.
    pub scores: BTreeMap<Metric, f32>,
}

impl ScoreRow {
    /// The score for `metric`, if it was computed.
    pub fn score(&self, metric: Metric) -> Option<f32> {
        self.scores.get(&metric).copied()
    }
}

/// One row per question, one column per metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    metrics: Vec<Metric>,
    rows: Vec<ScoreRow>,
}

impl ScoreReport {
    /// Create an empty report with the given metric columns.
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics, rows: Vec::new() }
    }

    pub(crate) fn push(&mut self, row: ScoreRow) {
        self.rows.push(row);
    }

    /// The metric columns, in order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// The rows, in question order.
    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    /// Every score for `metric`, in question order.
    pub fn column(&self, metric: Metric) -> Vec<f32> {
        self.rows.iter().filter_map(|row| row.score(metric)).collect()
    }

    /// Mean score for `metric`, or `None` when the column is empty.
    pub fn mean(&self, metric: Metric) -> Option<f32> {
        let column = self.column(metric);
        if column.is_empty() {
            return None;
        }
        Some(column.iter().sum::<f32>() / column.len() as f32)
    }

    /// Render a fixed-width text table with a trailing mean row.
    pub fn to_table(&self) -> String {
        let question_width = self
            .rows
            .iter()
            .map(|row| row.question.chars().count().min(QUESTION_WIDTH))
            .max()
            .unwrap_or(0)
            .max("question".len());

        let mut out = String::new();
        out.push_str(&format!("{:<question_width$}", "question"));
        for metric in &self.metrics {
            out.push_str(&format!("  {:>width$}", metric.name(), width = column_width(*metric)));
        }
        out.push('\n');

        for row in &self.rows {
            out.push_str(&format!("{:<question_width$}", truncate(&row.question, QUESTION_WIDTH)));
            for metric in &self.metrics {
                let cell = row.score(*metric).map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));
                out.push_str(&format!("  {:>width$}", cell, width = column_width(*metric)));
            }
            out.push('\n');
        }

        out.push_str(&format!("{:<question_width$}", "mean"));
        for metric in &self.metrics {
            let cell = self.mean(*metric).map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));
            out.push_str(&format!("  {:>width$}", cell, width = column_width(*metric)));
        }
        out.push('\n');
        out
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::IoError`] if the file cannot be written.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| EvalError::DataError(format!("failed to serialize report: {e}")))?;
        std::fs::write(path, json).map_err(|e| EvalError::io(path, e))?;
        info!(path = %path.display(), row_count = self.rows.len(), "wrote score report");
        Ok(())
    }
}

fn column_width(metric: Metric) -> usize {
    metric.name().len().max(6)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
