//! Error types for sf-rest.

/// Result type alias for sf-rest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sf-rest operations.
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

    /// Reclassify a provider rejection as a SOQL error.
    pub(crate) fn into_soql(self) -> Self {
        match self.kind {
            ErrorKind::Client {
                status: Some(_),
                message,
            } => Self {
                kind: ErrorKind::Soql(message),
                source: self.source,
            },
            kind => Self {
                kind,
                source: self.source,
            },
        }
    }

    /// Reclassify a provider rejection as a REST error for `url`.
    pub(crate) fn into_rest(self, url: &str) -> Self {
        match self.kind {
            ErrorKind::Client {
                status: Some(_),
                message,
            } => Self {
                kind: ErrorKind::Rest {
                    url: url.to_string(),
                    message,
                },
                source: self.source,
            },
            kind => Self {
                kind,
                source: self.source,
            },
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Authentication failed, including a session rejected again right
    /// after re-authenticating.
    #[error("{0}")]
    Auth(playforce_sf_auth::ErrorKind),

    /// The query endpoint rejected a SOQL statement.
    #[error("Salesforce SOQL error: {0}")]
    Soql(String),

    /// An sObjects REST call was rejected.
    #[error("REST API error: {message}\nURL: {url}")]
    Rest { url: String, message: String },

    /// A write operation was attempted without a valid license.
    #[error("License required: {0}")]
    License(String),

    /// Caller input that is never sent to the server.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport or decoding failure. `status` is set when the server
    /// answered with a non-2xx response, and `message` then carries its body.
    #[error("{message}")]
    Client {
        status: Option<u16>,
        message: String,
    },
}

impl From<playforce_sf_client::Error> for Error {
    fn from(err: playforce_sf_client::Error) -> Self {
        let status = err.status();
        let message = err
            .provider_body()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        Error::with_source(ErrorKind::Client { status, message }, err)
    }
}

impl From<playforce_sf_auth::Error> for Error {
    fn from(err: playforce_sf_auth::Error) -> Self {
        Self {
            kind: ErrorKind::Auth(err.kind),
            source: err.source,
        }
    }
}

impl From<playforce_sf_license::Error> for Error {
    fn from(err: playforce_sf_license::Error) -> Self {
        Self {
            kind: ErrorKind::License(err.kind.to_string()),
            source: err.source,
        }
    }
}
