//! Error types for the session facade.

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for session operations.
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
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Profile selection, authentication or callback failure.
    #[error("{0}")]
    Auth(playforce_sf_auth::ErrorKind),

    /// Query, REST or describe failure.
    #[error("{0}")]
    Rest(playforce_sf_rest::ErrorKind),

    /// The license could not be loaded or is not valid.
    #[error("{0}")]
    License(playforce_sf_license::ErrorKind),

    /// The interactive flow ended without a callback.
    #[error("OAuth flow interrupted: {0}")]
    OAuthFlow(String),

    /// The session could not be set up.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<playforce_sf_auth::Error> for Error {
    fn from(err: playforce_sf_auth::Error) -> Self {
        Self {
            kind: ErrorKind::Auth(err.kind),
            source: err.source,
        }
    }
}

impl From<playforce_sf_rest::Error> for Error {
    fn from(err: playforce_sf_rest::Error) -> Self {
        Self {
            kind: ErrorKind::Rest(err.kind),
            source: err.source,
        }
    }
}

impl From<playforce_sf_license::Error> for Error {
    fn from(err: playforce_sf_license::Error) -> Self {
        Self {
            kind: ErrorKind::License(err.kind),
            source: err.source,
        }
    }
}
