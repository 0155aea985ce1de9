//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path must exist. Without one the standard locations are
    /// searched and defaults are used when none is present.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                let p = PathBuf::from(p);
                if !p.exists() {
                    return Err(Error::config_not_found(&p));
                }
                Some(p)
            }
            None => find_config_file(),
        };

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        let config = Self {
            schema,
            path: config_path,
        };
        config.validate()?;
        debug!(path = ?config.path, "configuration loaded");
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = Self {
            schema: toml::from_str(content)?,
            path: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the search and map layers cannot work with
    pub fn validate(&self) -> Result<()> {
        let search = &self.schema.search;
        if search.min_zoom > search.street_zoom {
            return Err(Error::invalid_config_value(
                "search.min_zoom",
                format!("{} is above street_zoom {}", search.min_zoom, search.street_zoom),
            ));
        }
        if search.min_query_length == 0 {
            return Err(Error::invalid_config_value("search.min_query_length", "must be at least 1"));
        }

        let map = &self.schema.map;
        if map.viewport_width_px <= 0.0 || map.viewport_height_px <= 0.0 {
            return Err(Error::invalid_config_value(
                "map.viewport",
                format!("{}x{} is not a drawable size", map.viewport_width_px, map.viewport_height_px),
            ));
        }
        if map.move_threshold_deg <= 0.0 {
            return Err(Error::invalid_config_value("map.move_threshold_deg", "must be positive"));
        }

        if !self.schema.api.base_url.starts_with("http") {
            return Err(Error::new(
                ErrorCode::ConfigValidationError,
                format!("api.base_url must be an http(s) URL: {}", self.schema.api.base_url),
            ));
        }
        Ok(())
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(".fourmore.toml"), PathBuf::from("fourmore.toml")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("fourmore").join("config.toml"));
    }

    candidates.into_iter().find(|candidate| candidate.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}", path.display())).with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}", path.display()),
        )
        .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.search.min_query_length, 3);
        assert_eq!(config.schema.search.suggestion_debounce_ms, 300);
        assert_eq!(config.schema.map.refetch_debounce_ms, 400);
        assert_eq!(config.schema.geolocation.maximum_age_secs, 300);
        assert_eq!(config.schema.api.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_config_partial_toml() {
        let config = Config::from_toml(
            r#"
            [search]
            min_zoom = 10
            street_zoom = 16

            [map.padding]
            top = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.schema.search.min_zoom, 10.0);
        assert_eq!(config.schema.search.street_zoom, 16.0);
        assert_eq!(config.schema.search.category_result_limit, 100);
        assert_eq!(config.schema.map.padding.top, 120.0);
        assert_eq!(config.schema.map.padding.bottom, 200.0);
    }

    #[test]
    fn test_config_rejects_inverted_zoom_range() {
        let err = Config::from_toml("[search]\nmin_zoom = 18\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
    }

    #[test]
    fn test_config_parse_error() {
        let err = Config::from_toml("[search\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_config_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://api.fourmore.example\"\ntimeout_secs = 5").unwrap();

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.schema.api.base_url, "https://api.fourmore.example");
        assert_eq!(config.schema.api.timeout_secs, 5);
        assert_eq!(config.path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_config_load_missing_explicit_file() {
        let err = Config::load(Some("/definitely/not/here/fourmore.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_log_dir_expansion() {
        let config = Config::from_toml("[telemetry]\nlog_dir = \"/var/log/fourmore\"\n").unwrap();
        assert_eq!(
            config.schema.telemetry.resolved_log_dir(),
            Some(PathBuf::from("/var/log/fourmore"))
        );
        assert!(Config::default().schema.telemetry.resolved_log_dir().is_none());
    }
}
