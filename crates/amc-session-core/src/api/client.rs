//! HTTP client for the remote auth authority.
//!
//! The authority issues credentials through two endpoints:
//! `POST /auth/login` with a username/password body, and `POST /auth/refresh`
//! authenticated with the current bearer token. Both answer `{"jwtToken": ...}`.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;

use super::{ApiError, AuthEndpoint};

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "jwtToken", default)]
    jwt_token: Option<String>,
}

/// Exchanges with the auth authority that issue a new credential.
///
/// The lifecycle controller only needs `refresh`; `login` is used by the
/// sign-in front end and shares the same response handling.
pub trait AuthApi: Send + Sync + 'static {
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    fn refresh(&self, token: &str) -> impl Future<Output = Result<String, ApiError>> + Send;
}

/// API client for the auth authority.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn an auth response into the issued token, mapping non-2xx statuses
    /// and bodies without a token to errors.
    async fn read_token(
        endpoint: AuthEndpoint,
        response: reqwest::Response,
    ) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(endpoint, status, &body));
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::MalformedBody {
                endpoint,
                reason: e.to_string(),
            })?;

        match parsed.jwt_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ApiError::MissingToken { endpoint }),
        }
    }
}

impl AuthApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(url = %url, username = username, "Sending login request");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        Self::read_token(AuthEndpoint::Login, response).await
    }

    async fn refresh(&self, token: &str) -> Result<String, ApiError> {
        let url = self.url(REFRESH_PATH);
        debug!(url = %url, "Sending refresh request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .send()
            .await?;

        Self::read_token(AuthEndpoint::Refresh, response).await
    }
}
