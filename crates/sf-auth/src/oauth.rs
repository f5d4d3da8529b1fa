//! OAuth 2.0 token endpoint client.
//!
//! Supports the password, client-credentials and authorization-code grants
//! against `{login_url}/services/oauth2/token`, plus the authorization URL
//! for the interactive flow.

use playforce_sf_client::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::profile::{GrantType, Profile};

/// OAuth client for authenticating with Salesforce.
#[derive(Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient").finish_non_exhaustive()
    }
}

impl Default for OAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OAuthClient {
    /// Create a new OAuth client.
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Create an OAuth client with the transport's timeouts and user agent.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;
        Ok(Self::with_http_client(http_client))
    }

    /// Username-password grant.
    ///
    /// Credentials are not logged.
    #[instrument(skip(self, profile), fields(profile = %profile.name))]
    pub async fn password_grant(&self, profile: &Profile) -> Result<TokenResponse> {
        let username = profile.username.as_deref().unwrap_or_default();
        let password = profile.password().unwrap_or_default();

        let mut params = vec![
            ("grant_type", GrantType::Password.as_str()),
            ("client_id", profile.client_id.as_str()),
        ];
        if let Some(secret) = profile.client_secret() {
            params.push(("client_secret", secret));
        }
        params.push(("username", username));
        params.push(("password", password));

        self.request_token(&profile.login_url, &params).await
    }

    /// Client-credentials grant.
    #[instrument(skip(self, profile), fields(profile = %profile.name))]
    pub async fn client_credentials_grant(&self, profile: &Profile) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", GrantType::ClientCredentials.as_str()),
            ("client_id", profile.client_id.as_str()),
        ];
        if let Some(secret) = profile.client_secret() {
            params.push(("client_secret", secret));
        }

        self.request_token(&profile.login_url, &params).await
    }

    /// Exchange an authorization code for tokens.
    ///
    /// `redirect_uri` must match the one used to obtain the code. The code
    /// parameter is not logged.
    #[instrument(skip(self, profile, code), fields(profile = %profile.name))]
    pub async fn exchange_code(
        &self,
        profile: &Profile,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", GrantType::AuthorizationCode.as_str()),
            ("code", code),
            ("client_id", profile.client_id.as_str()),
        ];
        if let Some(secret) = profile.client_secret() {
            params.push(("client_secret", secret));
        }
        params.push(("redirect_uri", redirect_uri));

        self.request_token(&profile.login_url, &params).await
    }

    /// Authorization endpoint URL for the interactive flow.
    ///
    /// `prompt=login` forces the provider to ask for credentials so a
    /// profile switch never reuses another org's browser session.
    pub fn authorization_url(profile: &Profile, redirect_uri: &str) -> String {
        format!(
            "{}/services/oauth2/authorize?response_type=code&client_id={}&redirect_uri={}&prompt=login",
            profile.login_url,
            urlencoding::encode(&profile.client_id),
            urlencoding::encode(redirect_uri),
        )
    }

    async fn request_token(&self, login_url: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let body = serde_urlencoded::to_string(params)?;

        let response = self
            .http_client
            .post(format!("{}/services/oauth2/token", login_url))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        self.handle_token_response(response).await
    }

    /// Handle a token response, checking for errors.
    async fn handle_token_response(&self, response: reqwest::Response) -> Result<TokenResponse> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Token endpoint rejected request");
            return Err(Error::new(ErrorKind::Auth {
                status: status.as_u16(),
                body: text,
            }));
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        Ok(token)
    }
}

/// Token response from OAuth.
///
/// Sensitive fields like `access_token` and `refresh_token` are redacted
/// in Debug output to prevent accidental exposure in logs.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token (if requested).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Instance URL.
    pub instance_url: String,
    /// User ID URL.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
    /// Signature for verification.
    #[serde(default)]
    pub signature: Option<String>,
    /// Issued at timestamp.
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .finish()
    }
}
