//! # playforce-sf-license
//!
//! Signed, time-bounded license verification.
//!
//! Write operations against an org (anything other than a GET) require a
//! valid license. The license lives in a `.env`-style file as
//! `PLAYFORCE_LICENSE=<base64>` and is verified with an embedded RSA public
//! key each time it is checked.
//!
//! ```rust,ignore
//! use playforce_sf_license::LicenseGate;
//!
//! let gate = LicenseGate::new("/home/me/.playforce/.env")?;
//! let check = gate.check();
//! if !check.licensed {
//!     eprintln!("{}", check.message);
//! }
//! ```

mod error;
mod gate;
mod license;

pub use error::{Error, ErrorKind, Result};
pub use gate::{LicenseCheck, LicenseGate, LICENSE_ENV_KEY};
pub use license::LicenseInfo;
