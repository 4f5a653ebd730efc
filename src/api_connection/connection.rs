use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    AnthropicAvailableModel, MessagesRequest, MessagesResponse, Provider, ANTHROPIC_BASE_URL,
    ANTHROPIC_MODELS, ANTHROPIC_VERSION,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("API returned no text content")]
    EmptyResponse,
}

impl Provider {
    pub fn anthropic(api_key_env_var_name: &str) -> Self {
        dotenv().ok();
        Self::Anthropic {
            api_key: api_key_env_var_name.to_string(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            available_models: ANTHROPIC_MODELS.to_vec(),
        }
    }

    /// Points the provider at another host, e.g. a local mock server.
    pub fn with_base_url(self, url: impl Into<String>) -> Self {
        match self {
            Provider::Anthropic {
                api_key,
                available_models,
                ..
            } => Provider::Anthropic {
                api_key,
                base_url: url.into(),
                available_models,
            },
        }
    }

    pub fn get_available_models(&self) -> Vec<AnthropicAvailableModel> {
        match self {
            Provider::Anthropic {
                available_models, ..
            } => available_models.clone(),
        }
    }

    pub async fn call_messages(
        &self,
        request: MessagesRequest,
    ) -> Result<MessagesResponse, ApiConnectionError> {
        match self {
            Provider::Anthropic {
                api_key: api_key_env_var_name,
                base_url,
                ..
            } => {
                dotenv().ok();
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
                let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));
                debug!(model = %request.model, %url, "sending messages request");

                let response = client
                    .post(&url)
                    .header("x-api-key", actual_api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let messages_response = response.json::<MessagesResponse>().await?;
                    Ok(messages_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}

/// Removes a surrounding markdown code fence (```` ``` ```` or ```` ```json ````)
/// from a model reply.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let without_open = match trimmed.split_once('\n') {
        Some((_, rest)) => rest,
        None => trimmed.trim_start_matches('`'),
    };
    without_open
        .trim_end()
        .trim_end_matches("```")
        .trim()
        .to_string()
}
