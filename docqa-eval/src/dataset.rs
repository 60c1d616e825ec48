//! Evaluation questions and the per-question records scored by the harness.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{EvalError, Result};

/// A question to put to the pipeline, with its reference answers.
///
/// Question files are JSON arrays of these objects:
///
/// ```json
/// [{"question": "How is a model created?", "ground_truths": ["By calling CreateModel."]}]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalQuestion {
    /// The question text.
    pub question: String,
    /// One or more reference answers.
    pub ground_truths: Vec<String>,
}

impl EvalQuestion {
    /// Create a question with a single reference answer.
    pub fn new(question: impl Into<String>, ground_truth: impl Into<String>) -> Self {
        Self { question: question.into(), ground_truths: vec![ground_truth.into()] }
    }

    /// Read a JSON question file.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::IoError`] if the file cannot be read and
    /// [`EvalError::DataError`] if it is not a valid question array.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let questions: Vec<Self> = serde_json::from_str(&raw).map_err(|e| {
            error!(path = %path.display(), error = %e, "invalid question file");
            EvalError::DataError(format!("invalid question file {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), question_count = questions.len(), "loaded questions");
        Ok(questions)
    }
}

/// One question with the pipeline's answer, the retrieved contexts, and the
/// reference answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    /// The question text.
    pub question: String,
    /// The pipeline's answer.
    pub answer: String,
    /// Context passages retrieved for the question, nearest first.
    pub contexts: Vec<String>,
    /// Reference answers.
    pub ground_truths: Vec<String>,
}

impl EvalRecord {
    /// The reference answers as one text, newline separated.
    pub fn reference(&self) -> String {
        self.ground_truths.join("\n")
    }
}

/// A column-consistent set of [`EvalRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDataset {
    records: Vec<EvalRecord>,
}

impl EvaluationDataset {
    /// Assemble a dataset from four parallel columns.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::DataError`] if the columns differ in length or a
    /// record has no non-blank ground truth.
    pub fn from_columns(
        questions: Vec<String>,
        answers: Vec<String>,
        contexts: Vec<Vec<String>>,
        ground_truths: Vec<Vec<String>>,
    ) -> Result<Self> {
        let len = questions.len();
        if answers.len() != len || contexts.len() != len || ground_truths.len() != len {
            return Err(EvalError::DataError(format!(
                "column lengths differ: {} questions, {} answers, {} contexts, {} ground truths",
                len,
                answers.len(),
                contexts.len(),
                ground_truths.len()
            )));
        }

        let records = questions
            .into_iter()
            .zip(answers)
            .zip(contexts)
            .zip(ground_truths)
            .map(|(((question, answer), contexts), ground_truths)| {
                if ground_truths.iter().all(|g| g.trim().is_empty()) {
                    return Err(EvalError::DataError(format!(
                        "question '{question}' has no ground truth"
                    )));
                }
                Ok(EvalRecord { question, answer, contexts, ground_truths })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { records })
    }

    /// The records in question order.
    pub fn records(&self) -> &[EvalRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_records_from_columns() {
        let dataset = EvaluationDataset::from_columns(
            strings(&["q1", "q2"]),
            strings(&["a1", "a2"]),
            vec![strings(&["c1"]), vec![]],
            vec![strings(&["g1"]), strings(&["g2", "g2b"])],
        )
        .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[1].question, "q2");
        assert!(dataset.records()[1].contexts.is_empty());
        assert_eq!(dataset.records()[1].reference(), "g2\ng2b");
    }

    #[test]
    fn length_mismatch_is_data_error() {
        let err = EvaluationDataset::from_columns(
            strings(&["q1", "q2"]),
            strings(&["a1"]),
            vec![vec![], vec![]],
            vec![strings(&["g1"]), strings(&["g2"])],
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::DataError(_)));
    }

    #[test]
    fn missing_ground_truth_is_data_error() {
        let err = EvaluationDataset::from_columns(
            strings(&["q1"]),
            strings(&["a1"]),
            vec![vec![]],
            vec![strings(&["  "])],
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::DataError(ref m) if m.contains("q1")));
    }

    #[test]
    fn loads_question_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("questions.json");
        fs::write(
            &path,
            r#"[{"question": "How is a model created?", "ground_truths": ["By calling CreateModel."]}]"#,
        )
        .unwrap();

        let questions = EvalQuestion::load_all(&path).unwrap();
        assert_eq!(questions, vec![EvalQuestion::new("How is a model created?", "By calling CreateModel.")]);
    }

    #[test]
    fn malformed_question_file_is_data_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("questions.json");
        fs::write(&path, r#"{"question": "not an array"}"#).unwrap();
        assert!(matches!(EvalQuestion::load_all(&path), Err(EvalError::DataError(_))));
        assert!(matches!(
            EvalQuestion::load_all(dir.path().join("absent.json")),
            Err(EvalError::IoError { .. })
        ));
    }
}
