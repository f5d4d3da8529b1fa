//! Error types for sf-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

/// Result type alias for sf-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sf-auth operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// No profile selected, or the selected profile cannot be read.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The profile lacks fields its grant type requires.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The token endpoint rejected the request. `body` is the provider's
    /// response verbatim.
    #[error("Salesforce auth failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// The authorization server redirected back with an error.
    #[error("OAuth error: {error} - {description}")]
    OAuth { error: String, description: String },

    /// The operation cannot be used with the current profile.
    #[error("Usage error: {0}")]
    Usage(String),

    /// Transport failure, including callback port exhaustion.
    #[error("Network error: {0}")]
    Network(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Sanitize the error message to avoid exposing URLs with tokens
        let message = err.to_string();
        let sanitized = if message.contains("access_token") || message.contains("token=") {
            "HTTP request failed (details redacted for security)".to_string()
        } else {
            message
        };
        Error::with_source(ErrorKind::Network(sanitized), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        let err = ErrorKind::OAuth {
            error: "access_denied".to_string(),
            description: "end-user denied authorization".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "OAuth error: access_denied - end-user denied authorization"
        );

        let err = ErrorKind::Auth {
            status: 400,
            body: r#"{"error":"invalid_grant","error_description":"authentication failure"}"#
                .to_string(),
        };
        assert!(err.to_string().contains("invalid_grant"));
        assert!(err.to_string().starts_with("Salesforce auth failed (400)"));
    }

    #[test]
    fn test_error_messages_dont_contain_credentials() {
        let err = Error::new(ErrorKind::Validation(
            "password grant requires username and password".to_string(),
        ));
        let msg = err.to_string();
        assert!(!msg.contains("Bearer"));
        assert!(!msg.contains("00D"));
    }
}
