//! OpenAI embedding and chat-completion clients.
//!
//! This module is only available when the `openai` feature is enabled. Both
//! clients call the HTTP API directly with `reqwest` and share credential
//! lookup and error classification.
//!
//! | Status / failure            | Error                      |
//! |-----------------------------|----------------------------|
//! | missing key, 401, 403       | [`RagError::AuthError`]    |
//! | network, 429, 5xx, bad body | [`RagError::ServiceError`] |

mod chat;
mod embedding;

pub use chat::OpenAIChatModel;
pub use embedding::OpenAIEmbeddingProvider;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{RagError, Result};

pub(crate) const PROVIDER: &str = "OpenAI";

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub(crate) fn api_key_from_env() -> Result<String> {
    let api_key = std::env::var(API_KEY_ENV)
        .map_err(|_| RagError::auth(PROVIDER, format!("{API_KEY_ENV} environment variable not set")))?;
    validate_api_key(api_key)
}

pub(crate) fn validate_api_key(api_key: String) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(RagError::auth(PROVIDER, "API key must not be empty"));
    }
    Ok(api_key)
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Map a non-success status and its body to a typed error.
pub(crate) fn status_error(status: StatusCode, body: String) -> RagError {
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RagError::auth(PROVIDER, format!("API returned {status}: {detail}"))
        }
        _ => RagError::service(PROVIDER, format!("API returned {status}: {detail}")),
    }
}

/// POST a JSON body with bearer auth and decode the JSON reply.
pub(crate) async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client.post(url).bearer_auth(api_key).json(body).send().await.map_err(|e| {
        error!(provider = PROVIDER, %url, error = %e, "request failed");
        RagError::service(PROVIDER, format!("request failed: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(provider = PROVIDER, %url, %status, "API error");
        return Err(status_error(status, body));
    }

    response.json::<R>().await.map_err(|e| {
        error!(provider = PROVIDER, %url, error = %e, "failed to parse response");
        RagError::service(PROVIDER, format!("failed to parse response: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_auth_error() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#.to_string();
        let err = status_error(StatusCode::UNAUTHORIZED, body);
        match err {
            RagError::AuthError { message, .. } => {
                assert!(message.contains("Incorrect API key provided"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rate_limit_is_service_error() {
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string());
        assert!(matches!(err, RagError::ServiceError { ref message, .. } if message.contains("slow down")));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(validate_api_key("  ".to_string()), Err(RagError::AuthError { .. })));
        assert_eq!(validate_api_key("sk-test".to_string()).unwrap(), "sk-test");
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("https://api.openai.com/v1/", "embeddings"), "https://api.openai.com/v1/embeddings");
        assert_eq!(endpoint("http://localhost:8080/v1", "chat/completions"), "http://localhost:8080/v1/chat/completions");
    }
}
