//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "apiUrl": "https://pay.example.edu/api",
//!   "timeoutSecs": 30,
//!   "maxAuthRetries": 1
//! }
//! ```
//! Unknown fields are preserved when saving. `CAMPUSPAY_API_URL` and
//! `CAMPUSPAY_TIMEOUT_SECS` override the file.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

pub const API_URL_ENV: &str = "CAMPUSPAY_API_URL";
pub const TIMEOUT_ENV: &str = "CAMPUSPAY_TIMEOUT_SECS";

/// Default transport timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of re-authentication attempts after a 401
pub const DEFAULT_MAX_AUTH_RETRIES: u32 = 1;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_auth_retries: Option<u32>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Validated settings for the payment client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URL without a trailing slash
    pub base_url: String,
    /// Transport timeout in seconds, `0` for none
    pub timeout_secs: u64,
    pub max_auth_retries: u32,
}

impl ClientConfig {
    /// Validate a base URL. Only absolute http(s) URLs are accepted.
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(Error::config(format!(
                "Payment service URL is not configured (set {} or apiUrl in {})",
                API_URL_ENV, SETTINGS_FILE
            )));
        }

        let parsed = url::Url::parse(trimmed)
            .map_err(|e| Error::config(format!("Invalid payment service URL '{}': {}", trimmed, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Payment service URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_auth_retries: DEFAULT_MAX_AUTH_RETRIES,
        })
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_auth_retries(mut self, max_auth_retries: u32) -> Self {
        self.max_auth_retries = max_auth_retries;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// CampusPay configuration
///
/// The public fields are the effective values, environment overrides
/// included. Only values read from `settings.json` or changed through the
/// setters are written back by [`Config::save`].
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_auth_retries: Option<u32>,
    file: SettingsFile,
}

impl Config {
    /// Load config from the data directory, applying environment overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, |name| std::env::var(name).ok())
    }

    /// Load with a custom environment lookup
    pub fn load_with_env(data_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            match serde_json::from_str(&content) {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("[Config] Ignoring malformed {}: {}", SETTINGS_FILE, e);
                    SettingsFile::default()
                }
            }
        } else {
            SettingsFile::default()
        };

        let api_url = env(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| raw.api_url.clone());

        let timeout_secs = match env(TIMEOUT_ENV) {
            Some(value) => Some(value.trim().parse::<u64>().map_err(|_| {
                Error::config(format!("{} must be a whole number of seconds", TIMEOUT_ENV))
            })?),
            None => raw.timeout_secs,
        };

        Ok(Self {
            api_url,
            timeout_secs,
            max_auth_retries: raw.max_auth_retries,
            file: raw,
        })
    }

    /// Set or clear the service URL. A new URL must pass [`ClientConfig::new`].
    pub fn set_api_url(&mut self, url: Option<&str>) -> Result<()> {
        let url = match url {
            Some(url) => Some(ClientConfig::new(url)?.base_url),
            None => None,
        };
        self.file.api_url = url.clone();
        self.api_url = url;
        Ok(())
    }

    /// Set or clear the transport timeout, `0` meaning none
    pub fn set_timeout_secs(&mut self, timeout_secs: Option<u64>) {
        self.file.timeout_secs = timeout_secs;
        self.timeout_secs = timeout_secs;
    }

    /// Service URL as stored in `settings.json`, ignoring environment overrides
    pub fn saved_api_url(&self) -> Option<&str> {
        self.file.api_url.as_deref()
    }

    /// Save config, preserving fields the CLI doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.api_url = self.file.api_url.clone();
        settings.timeout_secs = self.file.timeout_secs;
        settings.max_auth_retries = self.file.max_auth_retries;

        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Validated client settings
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(self.api_url.as_deref().unwrap_or_default())?;
        if let Some(timeout_secs) = self.timeout_secs {
            config = config.with_timeout_secs(timeout_secs);
        }
        if let Some(max_auth_retries) = self.max_auth_retries {
            config = config.with_max_auth_retries(max_auth_retries);
        }
        Ok(config)
    }
}
