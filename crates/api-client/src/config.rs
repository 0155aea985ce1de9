//! Configuration for the FourMore API client
//!
//! Supports file-based settings, environment overrides and builder-style
//! adjustments.

use crate::error::{ApiError, ApiResult};
use fourmore_core::config::ApiSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default local backend URL
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development backend
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    /// Parse from the `FOURMORE_ENV` environment variable
    pub fn from_env() -> Self {
        Self::parse(&env::var("FOURMORE_ENV").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the FourMore backend
    pub base_url: String,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Current environment
    pub environment: Environment,
    /// Where the session file lives; `None` uses the platform data directory
    pub session_path: Option<PathBuf>,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            environment: Environment::default(),
            session_path: None,
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `FOURMORE_API_URL`: Base URL of the backend
    /// - `FOURMORE_ENV`: Environment (development/staging/production)
    /// - `FOURMORE_TIMEOUT_SECS`: Request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Start from the `[api]` section of the config file, then apply
    /// environment overrides
    pub fn from_settings(settings: &ApiSettings) -> ApiResult<Self> {
        Self::default()
            .with_base_url(settings.base_url.clone())
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> ApiResult<Self> {
        self.environment = Environment::from_env();

        if let Ok(url) = env::var("FOURMORE_API_URL") {
            self.base_url = url;
        }

        if let Ok(raw) = env::var("FOURMORE_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ApiError::config(format!("FOURMORE_TIMEOUT_SECS is not a number: {raw}")))?;
            self.timeout = Duration::from_secs(secs);
        }

        Ok(self)
    }

    /// Create development configuration (local backend)
    #[must_use]
    pub fn development() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            ..Self::default()
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the environment
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Builder-style method to set the session file location
    #[must_use]
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(format!(
                "base_url must start with http:// or https://: {}",
                self.base_url
            )));
        }

        if self.environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ApiError::config("production base_url must use https"));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("prod"), Environment::Production);
        assert_eq!(Environment::parse("Staging"), Environment::Staging);
        assert_eq!(Environment::parse(""), Environment::Development);
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_base_url("https://api.fourmore.example")
            .with_timeout(Duration::from_secs(60))
            .with_session_path("/tmp/session.json");

        assert_eq!(config.base_url, "https://api.fourmore.example");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.session_path, Some(PathBuf::from("/tmp/session.json")));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::default().with_base_url("").validate().is_err());
        assert!(ClientConfig::default().with_base_url("ftp://x").validate().is_err());
        assert!(
            ClientConfig::default()
                .with_environment(Environment::Production)
                .validate()
                .is_err()
        );
        assert!(
            ClientConfig::default()
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
