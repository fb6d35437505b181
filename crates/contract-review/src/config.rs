//! Configuration for the contract review client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable overriding `service.base_url`
pub const ENV_API_URL: &str = "CONTRACT_REVIEW_API_URL";
/// Environment variable overriding `service.auth_token`
pub const ENV_API_TOKEN: &str = "CONTRACT_REVIEW_API_TOKEN";
/// Environment variable overriding `polling.interval_ms`
pub const ENV_POLL_INTERVAL_MS: &str = "CONTRACT_REVIEW_POLL_INTERVAL_MS";

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Remote analysis service
    #[serde(default)]
    pub service: ServiceConfig,
    /// Status polling
    #[serde(default)]
    pub polling: PollingConfig,
    /// User-visible messages
    #[serde(default)]
    pub messages: MessagesConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from the default location if it exists,
    /// else defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!("Loading configuration from {}", path.display());
                    Self::from_file(path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location (`<config dir>/contract-review/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("contract-review").join("config.toml"))
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.service.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.service.auth_token = Some(token);
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            self.polling.interval_ms = raw.trim().parse().map_err(|e| {
                Error::config(format!("{} must be an integer: {}", ENV_POLL_INTERVAL_MS, e))
            })?;
        }
        Ok(())
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(Error::config("service.base_url must not be empty"));
        }
        if self.polling.interval_ms == 0 {
            return Err(Error::config("polling.interval_ms must be greater than zero"));
        }
        Ok(())
    }
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// API base URL, including any `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Request timeout in seconds (uploads included)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}
fn default_timeout() -> u64 { 120 }
fn default_connect_timeout() -> u64 { 10 }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay before the first status check and between checks (default: 3000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 { 3000 }

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Messages shown when the service gives no detail of its own
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagesConfig {
    #[serde(default = "default_submission_failed")]
    pub submission_failed: String,
    #[serde(default = "default_status_check_failed")]
    pub status_check_failed: String,
    #[serde(default = "default_analysis_failed")]
    pub analysis_failed: String,
    /// Service said "complete" but sent no report
    #[serde(default = "default_missing_report")]
    pub missing_report: String,
}

fn default_submission_failed() -> String {
    "Erro ao iniciar a análise.".to_string()
}

fn default_status_check_failed() -> String {
    "Erro ao verificar status.".to_string()
}

fn default_analysis_failed() -> String {
    "A análise falhou.".to_string()
}

fn default_missing_report() -> String {
    "A análise terminou sem relatório.".to_string()
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            submission_failed: default_submission_failed(),
            status_check_failed: default_status_check_failed(),
            analysis_failed: default_analysis_failed(),
            missing_report: default_missing_report(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.polling.interval(), Duration::from_secs(3));
        assert_eq!(config.service.base_url, "http://localhost:8000/api");
        assert_eq!(config.messages.analysis_failed, "A análise falhou.");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[service]\nbase_url = \"https://review.example.com/api\"\n\n[polling]\ninterval_ms = 500"
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.service.base_url, "https://review.example.com/api");
        assert_eq!(config.service.timeout_secs, 120);
        assert_eq!(config.polling.interval_ms, 500);
        assert_eq!(config.messages, MessagesConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "http://10.0.0.5:9000/api"),
            (ENV_API_TOKEN, "secret"),
            (ENV_POLL_INTERVAL_MS, "250"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.service.base_url, "http://10.0.0.5:9000/api");
        assert_eq!(config.service.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.polling.interval_ms, 250);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_env_overrides(|key| (key == ENV_POLL_INTERVAL_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        config.polling.interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
