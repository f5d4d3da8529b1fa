//! Connection profiles.
//!
//! A profile is one `<name>.json` record in the config directory. Secrets
//! are redacted in Debug output and in serialized form.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, ErrorKind, Result};

/// OAuth grant used to obtain an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Password,
    ClientCredentials,
    AuthorizationCode,
}

impl GrantType {
    /// Wire value for the `grant_type` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Password => "password",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::AuthorizationCode => "authorization_code",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record as stored on disk.
#[derive(Deserialize)]
struct ProfileRecord {
    login_url: String,
    client_id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    grant_type: Option<GrantType>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, rename = "apiVersion", alias = "api_version")]
    api_version: Option<String>,
}

/// A parsed, defaulted connection profile.
#[derive(Clone, Serialize)]
pub struct Profile {
    /// Profile name (file stem).
    pub name: String,
    /// Login host, e.g. `https://login.salesforce.com`.
    pub login_url: String,
    /// Connected app consumer key.
    pub client_id: String,
    #[serde(serialize_with = "redact")]
    client_secret: Option<String>,
    /// Effective grant type after defaults.
    pub grant_type: GrantType,
    pub username: Option<String>,
    #[serde(serialize_with = "redact")]
    password: Option<String>,
    /// API version without the `v` prefix.
    #[serde(rename = "apiVersion")]
    pub api_version: String,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("login_url", &self.login_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("grant_type", &self.grant_type)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("api_version", &self.api_version)
            .finish()
    }
}

fn redact<S: Serializer>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_some("[REDACTED]"),
        None => serializer.serialize_none(),
    }
}

/// Empty strings count as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Profile {
    /// Parse a profile record and apply defaults.
    ///
    /// - `grant_type`: explicit value wins; otherwise `password` when both
    ///   `username` and `password` are set, else `client_credentials`
    /// - `apiVersion`: [`playforce_sf_client::DEFAULT_API_VERSION`], with
    ///   any leading `v` stripped
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let record: ProfileRecord = serde_json::from_str(json)?;

        let login_url = record.login_url.trim().trim_end_matches('/').to_string();
        if login_url.is_empty() {
            return Err(Error::new(ErrorKind::Config("login_url is empty".to_string())));
        }

        let username = non_empty(record.username);
        let password = non_empty(record.password);

        let grant_type = record.grant_type.unwrap_or(if username.is_some() && password.is_some() {
            GrantType::Password
        } else {
            GrantType::ClientCredentials
        });

        let api_version = record
            .api_version
            .as_deref()
            .map(playforce_sf_client::normalize_api_version)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| playforce_sf_client::DEFAULT_API_VERSION.to_string());

        Ok(Self {
            name: name.into(),
            login_url,
            client_id: record.client_id,
            client_secret: non_empty(record.client_secret),
            grant_type,
            username,
            password,
            api_version,
        })
    }

    /// Connected app consumer secret.
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    /// Password for the password grant.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns true when both username and password are set.
    pub fn has_user_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}
