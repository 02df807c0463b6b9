//! Configuration: the API origin, timeouts and which department to show.
//!
//! Read once at startup from `~/.config/campus-portal/config.toml` (or the
//! path given with `--config`).  A missing file means defaults.
//!
//! ```toml
//! [api]
//! base_url = "https://college.example/"
//! timeout_seconds = 15
//! connect_timeout_seconds = 5
//!
//! [site]
//! department = "cse"
//! notice_kind = "admissions"
//! notice_limit = 50
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin (and optional path prefix) the PHP endpoints live under.
    pub base_url: String,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            timeout_seconds: 15,
            connect_timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Department code used by the department, faculty and lab endpoints.
    pub department: String,
    /// `type` filter of the notices page.
    pub notice_kind: String,
    pub notice_limit: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            department: "cse".to_string(),
            notice_kind: "admissions".to_string(),
            notice_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub site: SiteConfig,
}

impl Config {
    /// `campus-portal/config.toml` under the platform config directory,
    /// or the current directory when there is none.
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("campus-portal").join("config.toml")
    }

    /// Load and validate the file at `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks:
    /// - the base URL is an absolute http(s) URL
    /// - both timeouts are non-zero
    /// - the notice limit is non-zero and the department code is not blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_origin()?;

        if self.api.timeout_seconds == 0 || self.api.connect_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Timeouts must be greater than zero".to_string(),
            });
        }
        if self.site.notice_limit == 0 {
            return Err(ConfigError::ValidationError {
                message: "notice_limit must be greater than zero".to_string(),
            });
        }
        if self.site.department.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "department must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The parsed API base, always ending in `/` so relative endpoint paths
    /// join underneath it.
    pub fn base_origin(&self) -> Result<Url, ConfigError> {
        let raw = self.api.base_url.trim();
        let with_slash = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };

        let url = Url::parse(&with_slash).map_err(|e| ConfigError::ValidationError {
            message: format!("Invalid base_url '{raw}': {e}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError {
                message: format!("base_url must use http or https, got '{}'", url.scheme()),
            });
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.base_origin().unwrap().as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [site]
            department = "mech"
            "#,
        )
        .unwrap();
        assert_eq!(config.site.department, "mech");
        assert_eq!(config.site.notice_limit, 50);
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn base_origin_gains_trailing_slash() {
        let mut config = Config::default();
        config.api.base_url = "https://college.test/portal".into();
        assert_eq!(config.base_origin().unwrap().as_str(), "https://college.test/portal/");
    }

    #[test]
    fn rejects_non_http_base() {
        let mut config = Config::default();
        config.api.base_url = "ftp://college.test".into();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError { .. })));

        config.api.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeouts_and_limits() {
        let mut config = Config::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.site.notice_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.site.department = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/campus-portal.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
