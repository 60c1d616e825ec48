//! Context-side metrics: precision, recall, and entity recall.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

use super::judge::{CONTEXT_PRECISION_PROMPT, CONTEXT_RECALL_PROMPT, ENTITY_PROMPT, flag, render};
use super::{Metric, MetricScorer};
use crate::dataset::EvalRecord;
use crate::error::{EvalError, Result};

#[derive(Debug, Deserialize)]
struct UsefulnessVerdict {
    #[serde(deserialize_with = "flag")]
    verdict: bool,
}

#[derive(Debug, Deserialize)]
struct Attributions {
    #[serde(default)]
    classifications: Vec<Attribution>,
}

#[derive(Debug, Deserialize)]
struct Attribution {
    #[serde(deserialize_with = "flag")]
    attributed: bool,
}

#[derive(Debug, Deserialize)]
struct Entities {
    #[serde(default)]
    entities: Vec<String>,
}

/// Mean of precision@i over the ranks holding a useful context.
fn average_precision(verdicts: &[bool]) -> f32 {
    let mut useful = 0usize;
    let mut total = 0.0f32;
    for (i, verdict) in verdicts.iter().enumerate() {
        if *verdict {
            useful += 1;
            total += useful as f32 / (i + 1) as f32;
        }
    }
    if useful == 0 { 0.0 } else { total / useful as f32 }
}

impl MetricScorer {
    /// Average precision of the contexts, each judged useful or not for
    /// reaching the reference answer.
    pub(super) async fn context_precision(&self, record: &EvalRecord) -> Result<f32> {
        let metric = Metric::ContextPrecision;
        let reference = record.reference();
        let mut verdicts = Vec::with_capacity(record.contexts.len());
        for context in &record.contexts {
            let prompt = render(CONTEXT_PRECISION_PROMPT, &[
                ("question", record.question.as_str()),
                ("context", context.as_str()),
                ("answer", reference.as_str()),
            ])?;
            let reply: UsefulnessVerdict = self.ask(metric, &prompt).await?;
            verdicts.push(reply.verdict);
        }
        debug!(%metric, ?verdicts, "judged contexts");
        Ok(average_precision(&verdicts))
    }

    /// Share of reference sentences the judge attributes to the contexts.
    pub(super) async fn context_recall(&self, record: &EvalRecord) -> Result<f32> {
        let metric = Metric::ContextRecall;
        let context = record.contexts.join("\n");
        let reference = record.reference();
        let prompt = render(CONTEXT_RECALL_PROMPT, &[
            ("question", record.question.as_str()),
            ("context", context.as_str()),
            ("ground_truth", reference.as_str()),
        ])?;
        let reply: Attributions = self.ask(metric, &prompt).await?;
        if reply.classifications.is_empty() {
            return Err(EvalError::metric(metric, "judge classified no reference sentences"));
        }

        let attributed = reply.classifications.iter().filter(|c| c.attributed).count();
        debug!(%metric, attributed, total = reply.classifications.len(), "attributed sentences");
        Ok(attributed as f32 / reply.classifications.len() as f32)
    }

    /// Share of reference entities that also occur in the contexts; 1 when
    /// the reference names no entities.
    pub(super) async fn context_entity_recall(&self, record: &EvalRecord) -> Result<f32> {
        let metric = Metric::ContextEntityRecall;
        let reference = self.entities(&record.reference()).await?;
        if reference.is_empty() {
            debug!(%metric, "reference has no entities");
            return Ok(1.0);
        }

        let contexts = self.entities(&record.contexts.join("\n")).await?;
        let found = reference.intersection(&contexts).count();
        debug!(%metric, found, total = reference.len(), "matched entities");
        Ok(found as f32 / reference.len() as f32)
    }

    /// Normalized entity set of a text; blank text has none.
    async fn entities(&self, text: &str) -> Result<HashSet<String>> {
        if text.trim().is_empty() {
            return Ok(HashSet::new());
        }
        let prompt = render(ENTITY_PROMPT, &[("text", text)])?;
        let reply: Entities = self.ask(Metric::ContextEntityRecall, &prompt).await?;
        Ok(reply
            .entities
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_precision_rewards_useful_contexts_first() {
        assert_eq!(average_precision(&[true, false]), 1.0);
        assert_eq!(average_precision(&[false, true]), 0.5);
        assert!((average_precision(&[true, false, true]) - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-6);
        assert_eq!(average_precision(&[false, false]), 0.0);
        assert_eq!(average_precision(&[]), 0.0);
    }
}
