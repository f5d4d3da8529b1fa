//! Local listener for the OAuth authorization-code redirect.
//!
//! The listener binds to the first free port of a small range on
//! `127.0.0.1`, serves `GET /oauth/callback`, and hands each callback to
//! whoever is waiting on [`CallbackListener::next_callback`].

use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Error, ErrorKind, Result};

/// Ports tried, in order, for the callback listener.
pub const DEFAULT_CALLBACK_PORTS: RangeInclusive<u16> = 8888..=8892;

/// Path the authorization server redirects to.
pub const CALLBACK_PATH: &str = "/oauth/callback";

/// What the browser redirect carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Authorization succeeded.
    Code(String),
    /// The provider reported an error (e.g. the user denied access).
    Error { error: String, description: String },
}

impl CallbackOutcome {
    /// The authorization code, or an [`ErrorKind::OAuth`] error.
    pub fn into_code(self) -> Result<String> {
        match self {
            CallbackOutcome::Code(code) => Ok(code),
            CallbackOutcome::Error { error, description } => {
                Err(Error::new(ErrorKind::OAuth { error, description }))
            }
        }
    }
}

type PendingSender = Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>;

#[derive(Clone)]
struct CallbackState {
    pending: PendingSender,
}

/// A bound, running callback listener.
///
/// Bind once per process and reuse it for every interactive flow.
#[derive(Debug)]
pub struct CallbackListener {
    port: u16,
    pending: PendingSender,
    shutdown: CancellationToken,
}

impl CallbackListener {
    /// Bind to the first available port in `ports` and start serving.
    ///
    /// Ports that are in use or not permitted are skipped; any other bind
    /// error fails immediately. Exhausting the range is one
    /// [`ErrorKind::Network`] error naming the range.
    pub async fn bind(ports: RangeInclusive<u16>) -> Result<Self> {
        let (start, end) = (*ports.start(), *ports.end());

        let mut bound = None;
        for port in ports {
            match TcpListener::bind(("127.0.0.1", port)).await {
                Ok(listener) => {
                    bound = Some((port, listener));
                    break;
                }
                Err(e) if matches!(e.kind(), IoErrorKind::AddrInUse | IoErrorKind::PermissionDenied) => {
                    debug!(port, error = %e, "Callback port unavailable, trying next");
                }
                Err(e) => {
                    return Err(Error::with_source(
                        ErrorKind::Network(format!(
                            "failed to bind OAuth callback listener on port {port}: {e}"
                        )),
                        e,
                    ));
                }
            }
        }

        let Some((port, listener)) = bound else {
            return Err(Error::new(ErrorKind::Network(format!(
                "no available port for the OAuth callback listener in range {start}-{end}"
            ))));
        };

        let pending: PendingSender = Arc::new(Mutex::new(None));
        let shutdown = CancellationToken::new();

        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
            .with_state(CallbackState {
                pending: pending.clone(),
            });

        let token = shutdown.clone();
        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await;
            if let Err(e) = result {
                error!(error = %e, "OAuth callback listener stopped");
            }
        });

        info!(port, "OAuth callback listener bound");
        Ok(Self {
            port,
            pending,
            shutdown,
        })
    }

    /// The port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Redirect URI to register with the authorization request.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, CALLBACK_PATH)
    }

    /// Receiver for the next callback. Replaces any earlier pending receiver.
    pub fn next_callback(&self) -> oneshot::Receiver<CallbackOutcome> {
        let (tx, rx) = oneshot::channel();
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    /// Stop serving. A pending receiver sees its sender dropped.
    pub fn shutdown(&self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.shutdown.cancel();
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    let outcome = if let Some(error) = params.get("error") {
        CallbackOutcome::Error {
            error: error.clone(),
            description: params.get("error_description").cloned().unwrap_or_default(),
        }
    } else if let Some(code) = params.get("code") {
        CallbackOutcome::Code(code.clone())
    } else {
        return (
            StatusCode::BAD_REQUEST,
            Html(page(
                "Invalid callback",
                "The request carried neither an authorization code nor an error.",
            )),
        );
    };

    let response = match &outcome {
        CallbackOutcome::Code(_) => (
            StatusCode::OK,
            Html(page(
                "Authentication complete",
                "You can close this window and return to Playforce.",
            )),
        ),
        CallbackOutcome::Error { error, description } => {
            warn!(error = %error, "OAuth provider returned an error");
            (
                StatusCode::OK,
                Html(page(
                    "Authentication failed",
                    &format!("{}: {}", html_escape(error), html_escape(description)),
                )),
            )
        }
    };

    let sender = state
        .pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    match sender {
        Some(tx) => {
            if tx.send(outcome).is_err() {
                debug!("OAuth callback receiver already dropped");
            }
        }
        None => warn!("OAuth callback arrived with no flow waiting"),
    }

    response
}

fn page(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Playforce - {title}</title></head>
<body>
    <h1>{title}</h1>
    <p>{message}</p>
</body>
</html>
"#
    )
}

fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
