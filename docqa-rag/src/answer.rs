//! Retrieval-augmented answer pipeline.
//!
//! [`AnswerPipeline`] retrieves context for a question, renders the prompt,
//! calls the completion model, and returns the reply as plain text. Each call
//! is independent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::completion::CompletionModel;
use crate::error::Result;
use crate::prompt::{PromptTemplate, format_context};
use crate::retriever::Retriever;

/// An answer together with the context passages it was generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The plain-text answer.
    pub text: String,
    /// The chunk texts placed in the prompt, nearest first.
    pub contexts: Vec<String>,
}

/// Question → retrieve → prompt → complete → plain text.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::AnswerPipeline;
///
/// let pipeline = AnswerPipeline::new(retriever, model);
/// println!("{}", pipeline.answer("How is a model created?").await?);
/// ```
pub struct AnswerPipeline {
    retriever: Arc<Retriever>,
    model: Arc<dyn CompletionModel>,
    template: PromptTemplate,
}

impl AnswerPipeline {
    /// Create a pipeline using the built-in question-answering template.
    pub fn new(retriever: Arc<Retriever>, model: Arc<dyn CompletionModel>) -> Self {
        Self { retriever, model, template: PromptTemplate::rag() }
    }

    /// Replace the prompt template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) unless
    /// the template references both `{question}` and `{context}`.
    pub fn with_template(mut self, template: impl Into<String>) -> Result<Self> {
        self.template = PromptTemplate::new(template, &["question", "context"])?;
        Ok(self)
    }

    /// The retriever this pipeline draws context from.
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Answer a question.
    ///
    /// # Errors
    ///
    /// Propagates retrieval and completion errors unchanged.
    pub async fn answer(&self, question: &str) -> Result<String> {
        Ok(self.answer_with_contexts(question).await?.text)
    }

    /// Answer a question and return the context passages that were used.
    pub async fn answer_with_contexts(&self, question: &str) -> Result<Answer> {
        let chunks = self.retriever.retrieve(question).await?;
        let context = format_context(&chunks);
        let prompt = self.template.render(&[("question", question), ("context", context.as_str())]);
        debug!(context_count = chunks.len(), prompt_len = prompt.len(), "rendered prompt");

        let raw = self.model.complete(&prompt).await.inspect_err(|e| {
            error!(model = self.model.name(), error = %e, "completion failed");
        })?;
        let text = parse_completion(&raw);
        if text.is_empty() {
            warn!(model = self.model.name(), "completion was empty");
        }

        info!(model = self.model.name(), answer_len = text.len(), "answered question");
        Ok(Answer { text, contexts: chunks.into_iter().map(|c| c.text).collect() })
    }
}

/// Reduce a raw completion to plain text: trim, and unwrap a reply that is
/// entirely one fenced block.
pub fn parse_completion(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_prefix("```").and_then(|s| s.strip_suffix("```")) {
        if inner.contains("```") {
            return trimmed.to_string();
        }
        let body = match inner.find('\n') {
            Some(newline) if !inner[..newline].contains(' ') => &inner[newline + 1..],
            _ => inner,
        };
        return body.trim().to_string();
    }
    trimmed.to_string()
}
