//! Session configuration.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use playforce_sf_auth::DEFAULT_CALLBACK_PORTS;
use playforce_sf_client::ClientConfig;

/// Overrides the profile directory.
pub const CONFIG_DIR_ENV: &str = "PLAYFORCE_CONFIG_DIR";
/// Overrides the license file.
pub const LICENSE_FILE_ENV: &str = "PLAYFORCE_LICENSE_FILE";

/// Where a [`Session`](crate::Session) finds its profiles and license, and
/// how it talks to Salesforce.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding one `<name>.json` per profile.
    pub config_dir: PathBuf,
    /// `.env`-style file carrying `PLAYFORCE_LICENSE`.
    pub license_file: PathBuf,
    /// Ports tried in order for the OAuth callback listener.
    pub callback_ports: RangeInclusive<u16>,
    /// HTTP client settings for API calls.
    pub client: ClientConfig,
    /// PEM public key used instead of the embedded license key.
    pub license_public_key: Option<Vec<u8>>,
}

fn playforce_home() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".playforce")
}

impl Default for SessionConfig {
    fn default() -> Self {
        let home = playforce_home();
        Self {
            config_dir: home.join("configs"),
            license_file: home.join(".env"),
            callback_ports: DEFAULT_CALLBACK_PORTS,
            client: ClientConfig::default(),
            license_public_key: None,
        }
    }
}

impl SessionConfig {
    /// Defaults, with directories overridden by `PLAYFORCE_CONFIG_DIR` and
    /// `PLAYFORCE_LICENSE_FILE` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            config.config_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup(LICENSE_FILE_ENV).filter(|v| !v.is_empty()) {
            config.license_file = PathBuf::from(file);
        }
        config
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_license_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.license_file = file.into();
        self
    }

    pub fn with_callback_ports(mut self, ports: RangeInclusive<u16>) -> Self {
        self.callback_ports = ports;
        self
    }

    pub fn with_client_config(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Verify licenses with this PEM-encoded RSA public key.
    pub fn with_license_public_key(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.license_public_key = Some(pem.into());
        self
    }
}
