//! Judge prompts and reply decoding.

use docqa_rag::PromptTemplate;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use tracing::error;

use super::Metric;
use crate::error::{EvalError, Result};

pub(super) const ANSWER_RELEVANCY_PROMPT: &str = r#"Generate {count} distinct questions that the given answer would be a direct response to. Also decide whether the answer is noncommittal, meaning evasive or vague (for example "I don't know").
Reply with JSON only, in the form {{"questions": ["..."], "noncommittal": 0}} where noncommittal is 1 or 0.

Answer: {answer}
"#;

pub(super) const ANSWER_CORRECTNESS_PROMPT: &str = r#"Compare the answer with the ground truth for the question. Break both into short factual statements and classify each one:
- TP: a statement in the answer that the ground truth supports
- FP: a statement in the answer that the ground truth does not support
- FN: a statement in the ground truth that the answer leaves out
Reply with JSON only, in the form {{"TP": ["..."], "FP": ["..."], "FN": ["..."]}}.

Question: {question}
Answer: {answer}
Ground truth: {ground_truth}
"#;

pub(super) const CONTEXT_PRECISION_PROMPT: &str = r#"Decide whether the context was useful in arriving at the given answer to the question.
Reply with JSON only, in the form {{"reason": "...", "verdict": 1}} where verdict is 1 if the context was useful and 0 if not.

Question: {question}
Context: {context}
Answer: {answer}
"#;

pub(super) const CONTEXT_RECALL_PROMPT: &str = r#"Split the ground truth into sentences. For each sentence decide whether it can be attributed to the context.
Reply with JSON only, in the form {{"classifications": [{{"statement": "...", "attributed": 1}}]}} where attributed is 1 or 0.

Question: {question}
Context: {context}
Ground truth: {ground_truth}
"#;

pub(super) const ENTITY_PROMPT: &str = r#"List the unique named entities in the text: proper nouns such as people, organisations, products, services, places and dates.
Reply with JSON only, in the form {{"entities": ["..."]}}.

Text: {text}
"#;

/// Render a judge prompt, requiring every supplied value to have a placeholder.
pub(super) fn render(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let required: Vec<&str> = values.iter().map(|(name, _)| *name).collect();
    Ok(PromptTemplate::new(template, &required)?.render(values))
}

/// Decode a judge reply. The JSON may be wrapped in a code fence or
/// surrounded by prose.
pub(super) fn parse_reply<T: DeserializeOwned>(metric: Metric, raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    let body = fenced_body(trimmed).or_else(|| object_span(trimmed)).unwrap_or(trimmed);
    serde_json::from_str(body).map_err(|e| {
        error!(%metric, error = %e, reply_len = raw.len(), "unparseable judge reply");
        EvalError::metric(metric, format!("unparseable judge reply: {e}"))
    })
}

fn fenced_body(text: &str) -> Option<&str> {
    const START_MARKERS: [&str; 4] = ["```json\n", "```json\r\n", "```\n", "```\r\n"];
    for start in START_MARKERS {
        if let Some(start_idx) = text.find(start) {
            let content_start = start_idx + start.len();
            if let Some(end_idx) = text[content_start..].find("```") {
                return Some(text[content_start..content_start + end_idx].trim());
            }
        }
    }
    None
}

fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Deserialize a judge verdict given as `1`/`0`, `true`/`false`, or `"yes"`/`"no"`.
pub(super) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(value) => Ok(value),
        FlagRepr::Int(value) => Ok(value != 0),
        FlagRepr::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" => Ok(true),
            "0" | "no" | "false" => Ok(false),
            other => Err(D::Error::custom(format!("invalid verdict '{other}'"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        #[serde(deserialize_with = "flag")]
        verdict: bool,
    }

    #[test]
    fn parses_bare_fenced_and_embedded_json() {
        let bare: Verdict = parse_reply(Metric::ContextPrecision, r#"{"verdict": 1}"#).unwrap();
        assert!(bare.verdict);

        let fenced: Verdict =
            parse_reply(Metric::ContextPrecision, "```json\n{\"verdict\": 0}\n```").unwrap();
        assert!(!fenced.verdict);

        let embedded: Verdict =
            parse_reply(Metric::ContextPrecision, "Sure! {\"verdict\": \"yes\"} Hope that helps.")
                .unwrap();
        assert!(embedded.verdict);
    }

    #[test]
    fn garbage_is_metric_error() {
        let err = parse_reply::<Verdict>(Metric::ContextRecall, "I cannot answer that.").unwrap_err();
        assert!(matches!(err, EvalError::MetricError { metric: Metric::ContextRecall, .. }));

        let err = parse_reply::<Verdict>(Metric::ContextRecall, r#"{"verdict": "maybe"}"#).unwrap_err();
        assert!(matches!(err, EvalError::MetricError { .. }));
    }

    #[test]
    fn prompts_render_with_escaped_json() {
        let prompt = render(ENTITY_PROMPT, &[("text", "Amazon SageMaker")]).unwrap();
        assert!(prompt.contains(r#"{"entities": ["..."]}"#));
        assert!(prompt.contains("Text: Amazon SageMaker"));

        let prompt = render(CONTEXT_RECALL_PROMPT, &[
            ("question", "q"),
            ("context", "c"),
            ("ground_truth", "g"),
        ])
        .unwrap();
        assert!(prompt.contains(r#"{"classifications": [{"statement": "...", "attributed": 1}]}"#));
    }

    #[test]
    fn render_rejects_missing_placeholder() {
        assert!(render(ENTITY_PROMPT, &[("answer", "a")]).is_err());
    }
}
