//! Text-completion model trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RagConfig;
use crate::error::Result;

/// A remote text-completion service: one prompt in, one text reply out.
///
/// Implementations must not keep conversation state between calls.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// The model identifier, for logging.
    fn name(&self) -> &str;
}

/// Construct the chat-completion model named by `config.model_name`.
///
/// # Errors
///
/// Returns [`RagError::AuthError`](crate::RagError::AuthError) if the
/// credential is missing.
#[cfg(feature = "openai")]
pub fn build_completion_model(config: &RagConfig) -> Result<Arc<dyn CompletionModel>> {
    Ok(Arc::new(crate::openai::OpenAIChatModel::from_config(config)?))
}

/// Construct the chat-completion model named by `config.model_name`.
#[cfg(not(feature = "openai"))]
pub fn build_completion_model(_config: &RagConfig) -> Result<Arc<dyn CompletionModel>> {
    Err(crate::error::RagError::ConfigError(
        "the `openai` feature is disabled in this build".to_string(),
    ))
}
