//! # playforce-sf-auth
//!
//! Connection profiles and authentication for Playforce.
//!
//! ## Security
//!
//! - Secrets and tokens are redacted in Debug output
//! - Tracing skips credential parameters
//! - Access tokens live in process memory only
//!
//! ## Supported grants
//!
//! - **Username-password** for profiles carrying user credentials
//! - **Client credentials** for integration users
//! - **Authorization code** through a local [`CallbackListener`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use playforce_sf_auth::{Authenticator, CallbackListener, DEFAULT_CALLBACK_PORTS};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), playforce_sf_auth::Error> {
//!     let auth = Authenticator::new("/home/me/.playforce/configs");
//!     auth.select_profile("dev");
//!
//!     let attempt = auth.try_authenticate().await;
//!     if attempt.needs_oauth {
//!         let listener = CallbackListener::bind(DEFAULT_CALLBACK_PORTS).await?;
//!         let callback = listener.next_callback();
//!         println!("Open {}", auth.authorization_url(&listener.redirect_uri())?);
//!         if let Ok(outcome) = callback.await {
//!             let code = outcome.into_code()?;
//!             auth.authenticate_with_auth_code(&code, &listener.redirect_uri()).await?;
//!         }
//!     }
//!
//!     let creds = auth.credentials(false).await?;
//!     Ok(())
//! }
//! ```

mod authenticator;
mod callback;
mod credentials;
mod error;
mod oauth;
mod profile;
mod store;
mod token_cache;

pub use authenticator::{AuthAttempt, Authenticator};
pub use callback::{CallbackListener, CallbackOutcome, CALLBACK_PATH, DEFAULT_CALLBACK_PORTS};
pub use credentials::{Credentials, SalesforceCredentials};
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, TokenResponse};
pub use profile::{GrantType, Profile};
pub use store::ConfigStore;
pub use token_cache::{MemoryTokenCache, TokenStorage};
