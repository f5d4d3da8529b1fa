//! # playforce
//!
//! Salesforce session and SOQL query engine for the Playforce desktop
//! client.
//!
//! ## Security
//!
//! - Secrets are redacted in Debug output and in serialized profiles
//! - Tracing skips credential parameters
//! - Tokens live in process memory only
//!
//! ## Crates
//!
//! - **playforce-sf-client** - HTTP transport, response classification, SOQL identifier checks
//! - **playforce-sf-auth** - Profiles, token cache, OAuth grants and the callback listener
//! - **playforce-sf-license** - License verification for write operations
//! - **playforce-sf-rest** - Retry-on-expiry execution, paged queries, sObjects REST, describe
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use playforce::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = Session::create(SessionConfig::from_env())?;
//!     session.select_config("dev");
//!
//!     let attempt = session.try_authenticate().await;
//!     if attempt.needs_oauth {
//!         let flow = session.start_oauth_flow().await?;
//!         println!("Open {}", flow.authorization_url);
//!         session.complete_oauth_flow(flow).await?;
//!     }
//!
//!     let outcome = session.execute_soql("SELECT * FROM Account LIMIT 10").await?;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!     session.shutdown();
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod session;

pub use config::{SessionConfig, CONFIG_DIR_ENV, LICENSE_FILE_ENV};
pub use error::{Error, ErrorKind, Result};
pub use session::{OAuthFlow, Session};

// Re-export all crates for convenient access
pub use playforce_sf_auth as auth;
pub use playforce_sf_client as client;
pub use playforce_sf_license as license;
pub use playforce_sf_rest as rest;

// Re-export commonly used types at the top level
pub use playforce_sf_auth::{AuthAttempt, Profile};
pub use playforce_sf_client::{ClientConfig, RequestMethod};
pub use playforce_sf_license::{LicenseCheck, LicenseInfo};
pub use playforce_sf_rest::{QueryEvent, QueryOutcome, QueryProgress, QueryRecords};
