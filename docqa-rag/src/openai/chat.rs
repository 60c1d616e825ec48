//! OpenAI chat-completion model using the `/chat/completions` API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PROVIDER, api_key_from_env, endpoint, post_json, validate_api_key};
use crate::completion::CompletionModel;
use crate::config::{DEFAULT_OPENAI_BASE_URL, RagConfig};
use crate::error::{RagError, Result};

/// A [`CompletionModel`] backed by the OpenAI chat-completions API.
///
/// Each prompt is sent as a single user message; no conversation state is
/// kept between calls.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIChatModel;
///
/// let model = OpenAIChatModel::from_env("gpt-3.5-turbo")?.with_temperature(0.0);
/// let text = model.complete("Say hello").await?;
/// ```
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a model client with the given API key and model name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::AuthError`] if the key is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: validate_api_key(api_key.into())?,
            base_url: DEFAULT_OPENAI_BASE_URL.into(),
            model: model.into(),
            temperature: 0.0,
        })
    }

    /// Create a model client using the `OPENAI_API_KEY` environment variable.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        Self::new(api_key_from_env()?, model)
    }

    /// Create a model client from the pipeline configuration.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Ok(Self::from_env(&config.model_name)?
            .with_temperature(config.temperature)
            .with_base_url(&config.openai_base_url))
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn first_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RagError::service(PROVIDER, "API returned no completion content"))
}

#[async_trait]
impl CompletionModel for OpenAIChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            prompt_len = prompt.len(),
            temperature = self.temperature,
            "requesting completion"
        );

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };
        let url = endpoint(&self.base_url, "chat/completions");
        let response: ChatResponse = post_json(&self.client, &url, &self.api_key, &request).await?;
        first_content(response)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
