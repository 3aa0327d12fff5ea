//! Remote record store configuration.
//!
//! # Responsibility
//! - Collect the credentials and endpoint needed to build the remote client.
//! - Fail at startup when required credentials are absent.
//!
//! # Invariants
//! - `project_id` and `public_key` are non-blank once a config exists.
//! - `base_url` never ends with `/`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const PROJECT_ID_VAR: &str = "CRM_PROJECT_ID";
pub const PUBLIC_KEY_VAR: &str = "CRM_PUBLIC_KEY";
pub const BASE_URL_VAR: &str = "CRM_BASE_URL";
pub const TIMEOUT_VAR: &str = "CRM_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is unset or blank.
    Missing(&'static str),
    /// Variable is set but cannot be parsed.
    Invalid { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "required configuration `{var}` is not set"),
            Self::Invalid { var, value } => {
                write!(f, "configuration `{var}` has invalid value `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Connection settings for the remote record store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub public_key: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("public_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl StoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads configuration through `lookup`, one call per variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(var))
        };
        let project_id = required(PROJECT_ID_VAR)?;
        let public_key = required(PUBLIC_KEY_VAR)?;

        let base_url = lookup(BASE_URL_VAR)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: BASE_URL_VAR,
                value: base_url,
            });
        }

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(value) if !value.trim().is_empty() => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    var: TIMEOUT_VAR,
                    value,
                })?,
            _ => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            project_id,
            public_key,
            timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let err = StoreConfig::from_lookup(lookup(&[("CRM_PUBLIC_KEY", "pk")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("CRM_PROJECT_ID"));

        let err =
            StoreConfig::from_lookup(lookup(&[("CRM_PROJECT_ID", "p1"), ("CRM_PUBLIC_KEY", "  ")]))
                .unwrap_err();
        assert_eq!(err, ConfigError::Missing("CRM_PUBLIC_KEY"));
    }

    #[test]
    fn defaults_apply_and_base_url_is_normalized() {
        let config =
            StoreConfig::from_lookup(lookup(&[("CRM_PROJECT_ID", "p1"), ("CRM_PUBLIC_KEY", "pk")]))
                .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let config = StoreConfig::from_lookup(lookup(&[
            ("CRM_PROJECT_ID", "p1"),
            ("CRM_PUBLIC_KEY", "pk"),
            ("CRM_BASE_URL", "https://records.example.com/"),
            ("CRM_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://records.example.com");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[
            ("CRM_PROJECT_ID", "p1"),
            ("CRM_PUBLIC_KEY", "pk"),
            ("CRM_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CRM_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn debug_output_redacts_public_key() {
        let config =
            StoreConfig::from_lookup(lookup(&[("CRM_PROJECT_ID", "p1"), ("CRM_PUBLIC_KEY", "secret")]))
                .unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
