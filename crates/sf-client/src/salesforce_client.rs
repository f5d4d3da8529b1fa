//! High-level Salesforce client with typed HTTP methods.
//!
//! This module provides `SalesforceClient`, which combines an access token
//! and instance URL with an HTTP client and exposes the calls the query
//! engine and REST executor need.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Sensitive parameters are skipped in tracing spans

use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::client::SfHttpClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::{RequestBuilder, RequestMethod};
use crate::DEFAULT_API_VERSION;

/// High-level Salesforce API client bound to one session.
///
/// The access token is redacted in Debug output to prevent accidental
/// exposure in logs.
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

/// Strip a leading `v` so `"v57.0"` and `"57.0"` address the same version.
pub fn normalize_api_version(version: &str) -> String {
    let trimmed = version.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
        .to_string()
}

impl SalesforceClient {
    /// Create a new Salesforce client with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Create a new Salesforce client with custom configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let http = SfHttpClient::new(config)?;
        Ok(Self::from_http(http, instance_url, access_token))
    }

    /// Create a client that shares an existing connection pool.
    pub fn from_http(
        http: SfHttpClient,
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Set the API version (`"57.0"` or `"v57.0"`).
    pub fn with_api_version(mut self, version: impl AsRef<str>) -> Self {
        self.api_version = normalize_api_version(version.as_ref());
        self
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Get the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the API version, without the `v` prefix.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Build the full URL for a path.
    ///
    /// If the path starts with `/`, it's appended to the instance URL.
    /// Absolute URLs are returned unchanged.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.instance_url, path)
        } else {
            format!("{}/{}", self.instance_url, path)
        }
    }

    /// Build the REST API URL for a path.
    ///
    /// Example: `rest_url("sobjects/Account")` -> `/services/data/v57.0/sobjects/Account`
    pub fn rest_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Build an sObjects REST URL. An empty path addresses describe-global.
    pub fn sobjects_url(&self, path: &str) -> String {
        self.rest_url(&format!("sobjects/{}", path.trim_start_matches('/')))
    }

    /// Build the query URL for a SOQL statement.
    pub fn query_url(&self, soql: &str) -> String {
        format!(
            "{}/services/data/v{}/query/?q={}",
            self.instance_url,
            self.api_version,
            urlencoding::encode(soql)
        )
    }

    /// Create an authenticated request builder.
    pub fn request(&self, method: RequestMethod, url: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.access_token)
    }

    /// GET request with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let full_url = self.url(url);
        let request = self.request(RequestMethod::Get, &full_url);
        self.http.send_json(request).await
    }

    /// Send a request with an optional JSON body and return the JSON reply.
    ///
    /// `204 No Content` and empty bodies yield `Value::Null`.
    #[instrument(skip(self, body), fields(method = %method, url = %url))]
    pub async fn send_json(
        &self,
        method: RequestMethod,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let full_url = self.url(url);
        let mut request = self.request(method, &full_url);
        if let Some(body) = body {
            request = request.json_value(body.clone());
        }
        let response = self.http.execute(request).await?;
        if response.is_no_content() {
            return Ok(serde_json::Value::Null);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Execute a SOQL query and return the first page.
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        self.get_json(&self.query_url(soql)).await
    }

    /// Fetch the page addressed by a `nextRecordsUrl`.
    pub async fn query_more<T: DeserializeOwned>(
        &self,
        next_records_url: &str,
    ) -> Result<QueryResult<T>> {
        self.get_json(next_records_url).await
    }
}

/// One page of a SOQL query.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct QueryResult<T> {
    /// Total number of records matching the query.
    #[serde(rename = "totalSize")]
    pub total_size: u64,

    /// Whether all records are returned (no more pages).
    pub done: bool,

    /// Relative URL of the next page.
    #[serde(rename = "nextRecordsUrl", default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,

    /// The records.
    pub records: Vec<T>,
}
