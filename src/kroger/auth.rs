//! OAuth2 for the Kroger public API.
//!
//! Two grants are in play: client credentials for catalog and location
//! lookups, and authorization code (plus refresh) for the user's cart.

use chrono::Utc;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{ensure_success, KrogerError, AUTH_BASE_URL, REQUEST_TIMEOUT};

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const PRODUCT_SCOPE: &str = "product.compact";
pub const CART_SCOPE: &str = "cart.basic:write profile.compact";

/// Tokens are treated as expired this many seconds early.
const EXPIRY_MARGIN_SECS: f64 = 60.0;

#[derive(Debug, Clone, Default)]
pub struct KrogerCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: f64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
struct TokenFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_token: Option<String>,
    #[serde(default)]
    user_token_expires: f64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: f64,
}

impl CachedToken {
    fn from_response(body: &TokenResponse) -> Self {
        Self {
            token: body.access_token.clone(),
            expires_at: now_secs() + body.expires_in - EXPIRY_MARGIN_SECS,
        }
    }

    fn valid(&self) -> Option<&str> {
        (now_secs() < self.expires_at).then_some(self.token.as_str())
    }
}

fn now_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

pub struct KrogerAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_base: String,
    http: Client,
    app_token: Option<CachedToken>,
    user_token: Option<CachedToken>,
    refresh_token: Option<String>,
    token_file: PathBuf,
}

impl KrogerAuth {
    pub fn new(credentials: KrogerCredentials, token_file: impl Into<PathBuf>) -> Result<Self, KrogerError> {
        let client_id = credentials
            .client_id
            .filter(|s| !s.is_empty())
            .ok_or(KrogerError::MissingCredentials)?;
        let client_secret = credentials
            .client_secret
            .filter(|s| !s.is_empty())
            .ok_or(KrogerError::MissingCredentials)?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let mut auth = Self {
            client_id,
            client_secret,
            redirect_uri: credentials
                .redirect_uri
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            auth_base: AUTH_BASE_URL.to_string(),
            http,
            app_token: None,
            user_token: None,
            refresh_token: credentials.refresh_token.filter(|s| !s.is_empty()),
            token_file: token_file.into(),
        };
        auth.load_tokens();
        Ok(auth)
    }

    pub fn with_auth_base(mut self, url: impl Into<String>) -> Self {
        self.auth_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn token_file(&self) -> &Path {
        &self.token_file
    }

    pub fn has_user_auth(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    fn load_tokens(&mut self) {
        let raw = match std::fs::read_to_string(&self.token_file) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        let saved: TokenFile = match serde_json::from_str(&raw) {
            Ok(saved) => saved,
            Err(e) => {
                warn!(path = %self.token_file.display(), "ignoring unreadable token file: {}", e);
                return;
            }
        };
        if self.refresh_token.is_none() {
            self.refresh_token = saved.refresh_token;
        }
        self.user_token = saved.user_token.map(|token| CachedToken {
            token,
            expires_at: saved.user_token_expires,
        });
    }

    async fn save_tokens(&self) -> Result<(), KrogerError> {
        if let Some(parent) = self.token_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = TokenFile {
            refresh_token: self.refresh_token.clone(),
            user_token: self.user_token.as_ref().map(|t| t.token.clone()),
            user_token_expires: self.user_token.as_ref().map_or(0.0, |t| t.expires_at),
        };
        tokio::fs::write(&self.token_file, serde_json::to_string(&data)?).await?;
        debug!(path = %self.token_file.display(), "saved kroger tokens");
        Ok(())
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, KrogerError> {
        let response = self
            .http
            .post(format!("{}/token", self.auth_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<TokenResponse>().await?)
    }

    /// Client-credentials token for public endpoints (products, locations).
    pub async fn app_token(&mut self, scope: &str) -> Result<String, KrogerError> {
        if let Some(token) = self.app_token.as_ref().and_then(CachedToken::valid) {
            return Ok(token.to_string());
        }
        let body = self
            .request_token(&[("grant_type", "client_credentials"), ("scope", scope)])
            .await?;
        let cached = CachedToken::from_response(&body);
        let token = cached.token.clone();
        self.app_token = Some(cached);
        Ok(token)
    }

    /// URL the user must visit to grant cart access.
    pub fn authorize_url(&self, scope: &str) -> Result<Url, KrogerError> {
        Url::parse_with_params(
            &format!("{}/authorize", self.auth_base),
            &[
                ("scope", scope),
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| KrogerError::InvalidUrl(e.to_string()))
    }

    pub async fn exchange_code(&mut self, code: &str) -> Result<TokenResponse, KrogerError> {
        let redirect_uri = self.redirect_uri.clone();
        let body = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .await?;
        self.accept_user_token(&body).await?;
        info!("authorization code exchanged for user tokens");
        Ok(body)
    }

    /// User token for cart operations, refreshed when expired.
    pub async fn user_token(&mut self) -> Result<String, KrogerError> {
        if let Some(token) = self.user_token.as_ref().and_then(CachedToken::valid) {
            return Ok(token.to_string());
        }
        let refresh_token = self.refresh_token.clone().ok_or(KrogerError::NotAuthorized)?;
        let body = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .await?;
        self.accept_user_token(&body).await?;
        debug!("user token refreshed");
        Ok(body.access_token)
    }

    async fn accept_user_token(&mut self, body: &TokenResponse) -> Result<(), KrogerError> {
        self.user_token = Some(CachedToken::from_response(body));
        if let Some(refresh) = body.refresh_token.clone() {
            self.refresh_token = Some(refresh);
        }
        self.save_tokens().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn credentials() -> KrogerCredentials {
        KrogerCredentials {
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            redirect_uri: None,
            refresh_token: None,
        }
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let dir = TempDir::new().unwrap();
        let result = KrogerAuth::new(KrogerCredentials::default(), dir.path().join("t.json"));
        assert!(matches!(result, Err(KrogerError::MissingCredentials)));

        let mut creds = credentials();
        creds.client_secret = Some(String::new());
        let result = KrogerAuth::new(creds, dir.path().join("t.json"));
        assert!(matches!(result, Err(KrogerError::MissingCredentials)));
    }

    #[test]
    fn authorize_url_carries_oauth_params() {
        let dir = TempDir::new().unwrap();
        let auth = KrogerAuth::new(credentials(), dir.path().join("t.json")).unwrap();
        let url = auth.authorize_url(CART_SCOPE).unwrap();
        assert!(url.as_str().starts_with("https://api.kroger.com/v1/connect/oauth2/authorize?"));
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&("scope".to_string(), CART_SCOPE.to_string())));
        assert!(params.contains(&("response_type".to_string(), "code".to_string())));
        assert!(params.contains(&("client_id".to_string(), "client".to_string())));
        assert!(params.contains(&("redirect_uri".to_string(), DEFAULT_REDIRECT_URI.to_string())));
    }

    #[test]
    fn saved_refresh_token_is_loaded_unless_env_has_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kroger_tokens.json");
        std::fs::write(&path, r#"{"refresh_token":"from-file","user_token":"u","user_token_expires":0}"#).unwrap();

        let auth = KrogerAuth::new(credentials(), &path).unwrap();
        assert_eq!(auth.refresh_token(), Some("from-file"));

        let mut creds = credentials();
        creds.refresh_token = Some("from-env".to_string());
        let auth = KrogerAuth::new(creds, &path).unwrap();
        assert_eq!(auth.refresh_token(), Some("from-env"));
    }

    #[test]
    fn corrupt_token_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kroger_tokens.json");
        std::fs::write(&path, "not json").unwrap();
        let auth = KrogerAuth::new(credentials(), &path).unwrap();
        assert!(!auth.has_user_auth());
    }

    #[tokio::test]
    async fn user_token_without_refresh_token_fails() {
        let dir = TempDir::new().unwrap();
        let mut auth = KrogerAuth::new(credentials(), dir.path().join("t.json")).unwrap();
        assert!(matches!(auth.user_token().await, Err(KrogerError::NotAuthorized)));
    }
}
