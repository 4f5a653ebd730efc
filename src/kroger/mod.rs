pub mod auth;
pub mod client;
pub mod models;

use std::time::Duration;
use thiserror::Error;

pub use auth::{KrogerAuth, KrogerCredentials};
pub use client::KrogerClient;

pub const API_BASE_URL: &str = "https://api.kroger.com/v1";
pub const AUTH_BASE_URL: &str = "https://api.kroger.com/v1/connect/oauth2";

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum KrogerError {
    #[error("KROGER_CLIENT_ID and KROGER_CLIENT_SECRET are required")]
    MissingCredentials,
    #[error("No refresh token. Run `meal_cart kroger auth` to authorize cart access.")]
    NotAuthorized,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Token file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Kroger API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Turns a non-2xx response into [`KrogerError::Api`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, KrogerError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(KrogerError::Api { status, body })
}
