//! Prompt templating.

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// The question-answering prompt used by [`AnswerPipeline`](crate::AnswerPipeline).
pub const RAG_PROMPT_TEMPLATE: &str = "
You are an assistant for question-answering tasks.
Use the following pieces of retrieved context to answer the question.
If you don't know the answer, just say that you don't know. Use three sentences maximum and keep the answer concise. **do not cite extra resources**

Question: {question}

Context: {context}

Answer:
";

/// A template with `{name}` placeholders.
///
/// Substitution is a single left-to-right pass, so values containing
/// braces are inserted verbatim and never re-expanded. `{{` and `}}` render
/// as literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template that must reference every name in `required`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required placeholder is absent.
    pub fn new(template: impl Into<String>, required: &[&str]) -> Result<Self> {
        let template = template.into();
        let names = placeholders(&template);
        for name in required {
            if !names.iter().any(|n| n == name) {
                return Err(RagError::ConfigError(format!(
                    "prompt template is missing the {{{name}}} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The built-in question-answering template.
    pub fn rag() -> Self {
        Self { template: RAG_PROMPT_TEMPLATE.to_string() }
    }

    /// Placeholder names in order of appearance.
    pub fn variables(&self) -> Vec<String> {
        placeholders(&self.template)
    }

    /// Render the template. Unknown placeholders are left as written.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if let Some((name, after)) = parse_placeholder(tail) {
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&tail[..tail.len() - after.len()]),
                }
                rest = after;
            } else {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// Parse `{name}` at the start of `text`, returning the name and the text after it.
fn parse_placeholder(text: &str) -> Option<(&str, &str)> {
    let inner = text.strip_prefix('{')?;
    let end = inner.find('}')?;
    let name = &inner[..end];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, &inner[end + 1..]))
}

fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        let tail = &rest[pos..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            rest = &tail[2..];
        } else if let Some((name, after)) = parse_placeholder(tail) {
            names.push(name.to_string());
            rest = after;
        } else {
            rest = &tail[1..];
        }
    }
    names
}

/// Join chunk texts with blank lines into one context string.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            id: "d_0".into(),
            text: text.into(),
            metadata: HashMap::new(),
            document_id: "d".into(),
            index: 0,
        }
    }

    #[test]
    fn rag_template_has_both_placeholders() {
        assert_eq!(PromptTemplate::rag().variables(), vec!["question", "context"]);
    }

    #[test]
    fn substitutes_values_once() {
        let template = PromptTemplate::new("Q: {question}\nC: {context}", &["question", "context"])
            .unwrap();
        let rendered = template.render(&[("question", "What is {context}?"), ("context", "ctx")]);
        assert_eq!(rendered, "Q: What is {context}?\nC: ctx");
    }

    #[test]
    fn escaped_and_unknown_braces_survive() {
        let template = PromptTemplate::new("{{x}} {missing} {question} {", &["question"]).unwrap();
        assert_eq!(template.render(&[("question", "q")]), "{x} {missing} q {");
    }

    #[test]
    fn missing_placeholder_is_config_error() {
        let err = PromptTemplate::new("Q: {question}", &["question", "context"]).unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn context_joins_with_blank_lines() {
        assert_eq!(format_context(&[chunk("one"), chunk("two")]), "one\n\ntwo");
        assert_eq!(format_context(&[]), "");
    }
}
