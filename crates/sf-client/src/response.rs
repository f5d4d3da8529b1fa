//! HTTP response handling with Salesforce-specific extensions.

use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::error::{Error, ErrorKind, Result};

/// Error code Salesforce returns when an access token is no longer valid.
pub(crate) const INVALID_SESSION_ID: &str = "INVALID_SESSION_ID";

/// Wrapper around HTTP response with additional functionality.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    /// Returns true for 204 No Content.
    pub fn is_no_content(&self) -> bool {
        self.status() == 204
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the response body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    /// Deserialize the response body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.inner.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }
}

/// Extension trait for processing Salesforce API responses.
pub trait ResponseExt {
    /// Check for Salesforce API errors and convert to appropriate error type.
    fn check_salesforce_error(self) -> impl std::future::Future<Output = Result<Response>> + Send;
}

impl ResponseExt for Response {
    async fn check_salesforce_error(self) -> Result<Response> {
        let status = self.status();

        if self.is_success() {
            return Ok(self);
        }

        let body = self.text().await.unwrap_or_default();
        Err(parse_error_response(status, &body))
    }
}

/// Parse error response body and convert to appropriate error kind.
///
/// This is the single place session expiry is decided: HTTP 401, or an
/// `INVALID_SESSION_ID` error code on any status.
pub(crate) fn parse_error_response(status: u16, body: &str) -> Error {
    let sanitized = sanitize_error_message(body);

    let first = serde_json::from_str::<Vec<SalesforceErrorResponse>>(body)
        .ok()
        .and_then(|errors| errors.into_iter().next())
        .or_else(|| serde_json::from_str::<SalesforceErrorResponse>(body).ok());

    if let Some(err) = first {
        if status == 401 || err.error_code == INVALID_SESSION_ID {
            return Error::new(ErrorKind::SessionExpired {
                status,
                message: sanitized,
            });
        }
        return Error::new(ErrorKind::SalesforceApi {
            status,
            error_code: err.error_code,
            message: sanitize_error_message(&err.message),
            fields: err.fields.unwrap_or_default(),
            body: sanitized,
        });
    }

    let kind = match status {
        401 => ErrorKind::SessionExpired {
            status,
            message: sanitized,
        },
        403 => ErrorKind::Authorization(sanitized),
        404 => ErrorKind::NotFound(sanitized),
        _ => ErrorKind::Http {
            status,
            message: sanitized,
        },
    };

    Error::new(kind)
}

static TOKEN_PATTERN: LazyLock<Option<regex_lite::Regex>> =
    LazyLock::new(|| regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+").ok());

static SESSION_PATTERN: LazyLock<Option<regex_lite::Regex>> =
    LazyLock::new(|| regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}").ok());

/// Sanitize an error message to prevent exposing sensitive data.
///
/// - Removes anything that looks like an access token
/// - Removes session ids
/// - Truncates messages longer than 2000 characters
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 2000;

    let mut sanitized = message.to_string();

    if let Some(re) = TOKEN_PATTERN.as_ref() {
        sanitized = re.replace_all(&sanitized, "[REDACTED_TOKEN]").into_owned();
    }
    if let Some(re) = SESSION_PATTERN.as_ref() {
        sanitized = re.replace_all(&sanitized, "sid=[REDACTED]").into_owned();
    }

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}

/// Salesforce API error response format.
#[derive(Debug, serde::Deserialize)]
struct SalesforceErrorResponse {
    #[serde(alias = "errorCode")]
    error_code: String,
    message: String,
    fields: Option<Vec<String>>,
}
