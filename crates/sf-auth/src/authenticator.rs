//! Profile-scoped authentication.
//!
//! [`Authenticator`] ties the [`ConfigStore`], the token cache and the OAuth
//! client together. Every grant stores its token under the name of the
//! profile that produced it.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use playforce_sf_client::ClientConfig;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::credentials::SalesforceCredentials;
use crate::error::{Error, ErrorKind, Result};
use crate::oauth::{OAuthClient, TokenResponse};
use crate::profile::{GrantType, Profile};
use crate::store::ConfigStore;
use crate::token_cache::{MemoryTokenCache, TokenStorage};

/// Result of [`Authenticator::try_authenticate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthAttempt {
    pub success: bool,
    /// The caller should fall back to the interactive authorization-code flow.
    #[serde(rename = "needsOAuth")]
    pub needs_oauth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthAttempt {
    fn succeeded() -> Self {
        Self {
            success: true,
            needs_oauth: false,
            error: None,
        }
    }

    fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            needs_oauth: false,
            error: Some(error.to_string()),
        }
    }

    fn needs_oauth(error: Option<String>) -> Self {
        Self {
            success: false,
            needs_oauth: true,
            error,
        }
    }
}

/// Authenticates the selected profile and caches tokens per profile.
pub struct Authenticator {
    store: Mutex<ConfigStore>,
    tokens: Box<dyn TokenStorage>,
    oauth: OAuthClient,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("cached_tokens", &self.tokens.list())
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Create an authenticator over a config directory with an in-memory
    /// token cache.
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self::with_parts(
            ConfigStore::new(config_dir),
            Box::new(MemoryTokenCache::new()),
            OAuthClient::new(),
        )
    }

    /// Like [`Self::new`], with token requests bound by the transport
    /// settings.
    pub fn with_client_config(config_dir: impl AsRef<Path>, client: &ClientConfig) -> Result<Self> {
        Ok(Self::with_parts(
            ConfigStore::new(config_dir),
            Box::new(MemoryTokenCache::new()),
            OAuthClient::from_config(client)?,
        ))
    }

    /// Create an authenticator from explicit parts.
    pub fn with_parts(
        store: ConfigStore,
        tokens: Box<dyn TokenStorage>,
        oauth: OAuthClient,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            tokens,
            oauth,
        }
    }

    fn store(&self) -> MutexGuard<'_, ConfigStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Profile names in the config directory.
    pub fn list_profiles(&self) -> Vec<String> {
        self.store().list()
    }

    /// Select a profile. Cached tokens of other profiles are kept.
    pub fn select_profile(&self, name: &str) -> bool {
        self.store().select(name)
    }

    /// The selected profile, parsed and defaulted.
    pub fn current_profile(&self) -> Option<Profile> {
        self.store().current()
    }

    /// Name of the selected profile.
    pub fn current_profile_name(&self) -> Option<String> {
        self.store().current_name().map(str::to_string)
    }

    /// Whether the selected profile must go through the interactive flow
    /// before anything else is attempted.
    ///
    /// Always false: non-interactive grants are tried first and callers
    /// learn about the interactive fallback from [`Self::try_authenticate`].
    pub fn requires_oauth(&self) -> bool {
        false
    }

    fn require_profile(&self) -> Result<Profile> {
        self.current_profile().ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "No config selected or config file not found".to_string(),
            ))
        })
    }

    /// Run the grant configured for the selected profile and cache the token.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<TokenResponse> {
        let profile = self.require_profile()?;

        let token = match profile.grant_type {
            GrantType::Password => {
                if !profile.has_user_credentials() {
                    return Err(Error::new(ErrorKind::Validation(format!(
                        "profile '{}' uses the password grant but is missing username or password",
                        profile.name
                    ))));
                }
                self.oauth.password_grant(&profile).await?
            }
            GrantType::ClientCredentials => self.oauth.client_credentials_grant(&profile).await?,
            GrantType::AuthorizationCode => {
                return Err(Error::new(ErrorKind::Usage(format!(
                    "profile '{}' uses the authorization_code grant; start the interactive OAuth flow instead",
                    profile.name
                ))));
            }
        };

        info!(profile = %profile.name, grant = %profile.grant_type, "Authenticated");
        self.tokens.save(&profile.name, &token);
        Ok(token)
    }

    /// Authenticate without raising.
    ///
    /// Profiles with username and password use the password grant. Other
    /// profiles try client credentials and report `needs_oauth` when that
    /// is rejected.
    #[instrument(skip(self))]
    pub async fn try_authenticate(&self) -> AuthAttempt {
        let profile = match self.require_profile() {
            Ok(profile) => profile,
            Err(e) => return AuthAttempt::failed(e),
        };

        if profile.has_user_credentials() && profile.grant_type != GrantType::AuthorizationCode {
            return match self.oauth.password_grant(&profile).await {
                Ok(token) => {
                    self.tokens.save(&profile.name, &token);
                    AuthAttempt::succeeded()
                }
                Err(e) => {
                    warn!(profile = %profile.name, error = %e, "Password grant failed");
                    AuthAttempt::failed(e)
                }
            };
        }

        if profile.grant_type == GrantType::AuthorizationCode {
            return AuthAttempt::needs_oauth(None);
        }

        match self.oauth.client_credentials_grant(&profile).await {
            Ok(token) => {
                self.tokens.save(&profile.name, &token);
                AuthAttempt::succeeded()
            }
            Err(e) => {
                info!(profile = %profile.name, error = %e, "Client credentials rejected, interactive flow needed");
                AuthAttempt::needs_oauth(Some(e.to_string()))
            }
        }
    }

    /// Authorization endpoint URL for the selected profile.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String> {
        let profile = self.require_profile()?;
        Ok(OAuthClient::authorization_url(&profile, redirect_uri))
    }

    /// Exchange an authorization code and cache the token.
    #[instrument(skip(self, code))]
    pub async fn authenticate_with_auth_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse> {
        let profile = self.require_profile()?;
        let token = self.oauth.exchange_code(&profile, code, redirect_uri).await?;
        info!(profile = %profile.name, "Authenticated via authorization code");
        self.tokens.save(&profile.name, &token);
        Ok(token)
    }

    /// Credentials for the selected profile.
    ///
    /// Uses the cached token unless there is none or `force_refresh` is set,
    /// in which case [`Self::authenticate`] runs first.
    pub async fn credentials(&self, force_refresh: bool) -> Result<SalesforceCredentials> {
        let profile = self.require_profile()?;

        let cached = if force_refresh {
            None
        } else {
            self.tokens.load(&profile.name)
        };

        let token = match cached {
            Some(token) if !token.access_token.is_empty() => token,
            _ => self.authenticate().await?,
        };

        Ok(SalesforceCredentials::from_token(&token, &profile.api_version))
    }

    /// True if a token is cached for the selected profile.
    pub fn has_valid_token(&self) -> bool {
        self.current_profile_name()
            .is_some_and(|name| self.tokens.exists(&name))
    }
}
