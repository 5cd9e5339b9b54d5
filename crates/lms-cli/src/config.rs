//! Application configuration
//!
//! Read from a TOML file, then overridden from the environment:
//!
//! ```toml
//! [client]
//! base_url = "https://admin.example.com/api"
//! api_token = "..."
//! request_timeout_secs = 30
//!
//! [submission]
//! call_timeout_secs = 20
//! ```

use lms_core::SubmissionConfig;
use lms_remote::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "lms.toml";

/// Overrides `client.base_url`
pub const ENV_API_URL: &str = "LMS_API_URL";
/// Overrides `client.api_token`
pub const ENV_API_TOKEN: &str = "LMS_API_TOKEN";
/// Overrides `client.request_timeout_secs`
pub const ENV_REQUEST_TIMEOUT: &str = "LMS_REQUEST_TIMEOUT_SECS";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File missing or unreadable
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        /// File
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for [`AppConfig`]
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        /// File
        path: PathBuf,
        /// Parser failure
        #[source]
        source: toml::de::Error,
    },

    /// Environment override does not parse
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

/// Everything the `lms` binary needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend connection
    pub client: ClientConfig,
    /// Submission behaviour
    pub submission: SubmissionConfig,
}

impl AppConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists, then
    /// apply environment overrides.
    ///
    /// # Errors
    /// An explicitly named file that cannot be read, a file that does not
    /// parse, or an override that does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file.
    ///
    /// # Errors
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `LMS_*` overrides resolved through `lookup`.
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] for a non-numeric timeout.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.client.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|t| !t.is_empty()) {
            self.client.api_token = Some(token);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            self.client.request_timeout_secs =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_REQUEST_TIMEOUT,
                    value: raw.clone(),
                })?;
        }
        Ok(())
    }

    /// Copy safe to print: the token is masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if shown.client.api_token.is_some() {
            shown.client.api_token = Some("********".to_string());
        }
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_file_values() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| match key {
                ENV_API_URL => Some("https://lms.example.com/api/".into()),
                ENV_REQUEST_TIMEOUT => Some(" 5 ".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.client.base_url, "https://lms.example.com/api/");
        assert_eq!(config.client.request_timeout_secs, 5);
        assert_eq!(config.client.api_token, None);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = AppConfig::default()
            .apply_overrides(|key| (key == ENV_REQUEST_TIMEOUT).then(|| "soon".into()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_REQUEST_TIMEOUT, .. }));
    }

    #[test]
    fn redacted_hides_token() {
        let mut config = AppConfig::default();
        config.client.api_token = Some("secret".into());
        assert_eq!(config.redacted().client.api_token.as_deref(), Some("********"));
    }
}
