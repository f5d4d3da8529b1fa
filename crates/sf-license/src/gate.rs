//! The license gate consulted before write operations.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use jsonwebtoken::DecodingKey;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::license::{decode_token, parse_date, DecodeFailure, LicenseData, LicenseInfo};

/// Key in the license file (and fallback environment variable).
pub const LICENSE_ENV_KEY: &str = "PLAYFORCE_LICENSE";

const EMBEDDED_PUBLIC_KEY: &[u8] = include_bytes!("../keys/license_signing.pub.pem");

/// Result of a license check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseCheck {
    pub licensed: bool,
    /// User-facing explanation, for both outcomes.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<LicenseInfo>,
}

impl LicenseCheck {
    fn denied(message: impl Into<String>) -> Self {
        Self {
            licensed: false,
            message: message.into(),
            info: None,
        }
    }
}

/// Verifies the signed license record on every call.
///
/// Nothing is cached between checks, so replacing or removing the license
/// file takes effect on the next gated call.
#[derive(Clone)]
pub struct LicenseGate {
    env_file: PathBuf,
    key: DecodingKey,
}

impl std::fmt::Debug for LicenseGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseGate")
            .field("env_file", &self.env_file)
            .finish_non_exhaustive()
    }
}

impl LicenseGate {
    /// Gate reading `env_file`, verified with the embedded public key.
    pub fn new(env_file: impl Into<PathBuf>) -> Result<Self> {
        Self::with_public_key_pem(env_file, EMBEDDED_PUBLIC_KEY)
    }

    /// Gate verified with a caller-supplied RSA public key (PEM).
    pub fn with_public_key_pem(env_file: impl Into<PathBuf>, pem: &[u8]) -> Result<Self> {
        Ok(Self {
            env_file: env_file.into(),
            key: DecodingKey::from_rsa_pem(pem)?,
        })
    }

    /// Path of the license file.
    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    /// Check the license against the current time.
    pub fn check(&self) -> LicenseCheck {
        self.check_at(Utc::now())
    }

    /// Check the license as of `now`. Never fails; problems are reported in
    /// the returned [`LicenseCheck`].
    pub fn check_at(&self, now: DateTime<Utc>) -> LicenseCheck {
        let Some(token) = self.read_token() else {
            return LicenseCheck::denied(format!(
                "No license found. Add {LICENSE_ENV_KEY}=<license key> to {}",
                self.env_file.display()
            ));
        };

        let data = match decode_token(&token, &self.key) {
            Ok(data) => data,
            Err(DecodeFailure::Format) => {
                return LicenseCheck::denied("Invalid license format");
            }
            Err(DecodeFailure::Signature) => {
                warn!("License signature verification failed");
                return LicenseCheck::denied("Invalid license signature");
            }
        };

        evaluate(data, now)
    }

    /// Check the license and turn a denial into [`ErrorKind::NotLicensed`].
    pub fn require(&self) -> Result<LicenseInfo> {
        let check = self.check();
        match check.info {
            Some(info) if check.licensed => Ok(info),
            _ => Err(Error::new(ErrorKind::NotLicensed(check.message))),
        }
    }

    /// The license token from the file, else from the process environment.
    fn read_token(&self) -> Option<String> {
        match dotenvy::from_path_iter(&self.env_file) {
            Ok(iter) => {
                for item in iter {
                    match item {
                        Ok((key, value)) if key == LICENSE_ENV_KEY => {
                            return Some(value).filter(|v| !v.trim().is_empty());
                        }
                        Ok(_) => {}
                        Err(e) => {
                            debug!(error = %e, "Skipping unparsable license file line");
                        }
                    }
                }
            }
            Err(e) => {
                debug!(path = %self.env_file.display(), error = %e, "License file not readable");
            }
        }

        std::env::var(LICENSE_ENV_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

fn evaluate(data: LicenseData, now: DateTime<Utc>) -> LicenseCheck {
    let required = [
        ("organization", &data.organization),
        ("licenseeEmail", &data.licensee_email),
        ("tier", &data.tier),
        ("startDateUTC", &data.start_date),
    ];
    for (field, value) in required {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            return LicenseCheck::denied(format!("License is missing required field: {field}"));
        }
    }

    let Some(start) = data.start_date.as_deref().and_then(|v| parse_date(v, false)) else {
        return LicenseCheck::denied("Invalid license format: unreadable startDateUTC");
    };
    if now < start {
        return LicenseCheck::denied(format!(
            "License is not yet active (starts {})",
            start.format("%Y-%m-%d")
        ));
    }

    let paid_end = data.paid_end_date.as_deref().and_then(|v| parse_date(v, true));
    let free_end = data.free_end_date.as_deref().and_then(|v| parse_date(v, true));

    let (is_paid, expires_at) = match (paid_end, free_end) {
        (Some(end), _) if now <= end => (true, end),
        (_, Some(end)) if now <= end => (false, end),
        _ => {
            let last = paid_end.into_iter().chain(free_end).max();
            return LicenseCheck::denied(match last {
                Some(end) => format!("License expired on {}", end.format("%Y-%m-%d")),
                None => "License expired".to_string(),
            });
        }
    };

    let info = LicenseInfo {
        organization: data.organization.unwrap_or_default(),
        email: data.licensee_email.unwrap_or_default(),
        tier: data.tier.unwrap_or_default(),
        expires_at: Some(expires_at),
        is_paid,
    };

    let message = if is_paid {
        format!("Licensed to {} ({})", info.organization, info.tier)
    } else {
        format!(
            "Free license for {} valid until {}",
            info.organization,
            expires_at.format("%Y-%m-%d")
        )
    };

    LicenseCheck {
        licensed: true,
        message,
        info: Some(info),
    }
}
