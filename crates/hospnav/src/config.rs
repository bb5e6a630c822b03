//! Configuration management for hospnav.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "hospnav";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "local_storage.db";

/// Browsers give a page about 5 MiB of local storage.
const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `HOSPNAV_`, sections split on `__`)
/// 2. TOML config file at `~/.config/hospnav/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local storage configuration.
    pub storage: StorageConfig,
    /// Medication recognition configuration.
    pub recognition: RecognitionConfig,
    /// Dispenser endpoint configuration.
    pub dispenser: DispenserConfig,
}

/// Local storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/hospnav/local_storage.db`
    pub database_path: Option<PathBuf>,
    /// Maximum total bytes of stored values.
    /// Set to 0 for unlimited.
    pub quota_bytes: usize,
}

/// Configuration for the sample recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Simulated processing delay in milliseconds.
    pub delay_ms: u64,
    /// Lowest confidence percentage the sample recognizer reports.
    pub min_confidence: u8,
    /// Highest confidence percentage the sample recognizer reports.
    pub max_confidence: u8,
    /// Probability that a sample result is reported as matched.
    pub match_probability: f64,
}

/// How dispenser requests are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispenserMode {
    /// Post straight to the device-control endpoint.
    #[default]
    Direct,
    /// Post to a same-origin relative path that forwards to the device.
    Proxy,
}

/// Dispenser endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispenserConfig {
    /// Routing mode.
    pub mode: DispenserMode,
    /// Absolute URL of the device-control endpoint (direct mode).
    pub endpoint: String,
    /// Origin the proxy path is resolved against (proxy mode).
    pub proxy_origin: String,
    /// Relative path of the same-origin proxy.
    pub proxy_path: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1500,
            min_confidence: 70,
            max_confidence: 99,
            match_probability: 0.8,
        }
    }
}

impl RecognitionConfig {
    /// Check the confidence bounds and match probability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] for an inverted or out-of-range
    /// confidence range, or a probability outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.min_confidence > self.max_confidence {
            return Err(Error::ConfigValidation {
                message: format!(
                    "min_confidence ({}) cannot be greater than max_confidence ({})",
                    self.min_confidence, self.max_confidence
                ),
            });
        }

        if self.max_confidence > 100 {
            return Err(Error::ConfigValidation {
                message: format!("max_confidence ({}) cannot exceed 100", self.max_confidence),
            });
        }

        if !(0.0..=1.0).contains(&self.match_probability) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "match_probability ({}) must be between 0 and 1",
                    self.match_probability
                ),
            });
        }

        Ok(())
    }
}

impl Default for DispenserConfig {
    fn default() -> Self {
        Self {
            mode: DispenserMode::Direct,
            endpoint: "http://192.168.4.1/api/open".to_string(),
            proxy_origin: "http://localhost:3000".to_string(),
            proxy_path: "/api/dispenser/open".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("HOSPNAV_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.recognition.validate()?;

        if self.dispenser.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if let Err(e) = url::Url::parse(&self.dispenser.endpoint) {
            return Err(Error::ConfigValidation {
                message: format!("invalid dispenser endpoint '{}': {e}", self.dispenser.endpoint),
            });
        }

        if let Err(e) = url::Url::parse(&self.dispenser.proxy_origin) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "invalid dispenser proxy_origin '{}': {e}",
                    self.dispenser.proxy_origin
                ),
            });
        }

        if !self.dispenser.proxy_path.starts_with('/') {
            return Err(Error::ConfigValidation {
                message: format!(
                    "proxy_path must be a relative path starting with '/': {}",
                    self.dispenser.proxy_path
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the storage quota, or `None` when unlimited.
    #[must_use]
    pub fn quota(&self) -> Option<usize> {
        if self.storage.quota_bytes == 0 {
            None
        } else {
            Some(self.storage.quota_bytes)
        }
    }

    /// Get the recognition delay as a Duration.
    #[must_use]
    pub fn recognition_delay(&self) -> Duration {
        Duration::from_millis(self.recognition.delay_ms)
    }

    /// Get the dispenser request timeout as a Duration.
    #[must_use]
    pub fn dispenser_timeout(&self) -> Duration {
        Duration::from_secs(self.dispenser.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.storage.quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.dispenser.mode, DispenserMode::Direct);
    }

    #[test]
    fn test_default_recognition_config() {
        let recognition = RecognitionConfig::default();

        assert_eq!(recognition.delay_ms, 1500);
        assert_eq!(recognition.min_confidence, 70);
        assert_eq!(recognition.max_confidence, 99);
        assert!((recognition.match_probability - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_dispenser_config() {
        let dispenser = DispenserConfig::default();

        assert_eq!(dispenser.proxy_path, "/api/dispenser/open");
        assert_eq!(dispenser.timeout_secs, 10);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_inverted_confidence() {
        let mut config = Config::default();
        config.recognition.min_confidence = 90;
        config.recognition.max_confidence = 80;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_confidence"));
    }

    #[test]
    fn test_validate_confidence_over_100() {
        let mut config = Config::default();
        config.recognition.max_confidence = 101;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("cannot exceed 100"));
    }

    #[test]
    fn test_validate_match_probability() {
        let mut config = Config::default();
        config.recognition.match_probability = 1.5;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("match_probability"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.dispenser.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = Config::default();
        config.dispenser.endpoint = "not a url".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("dispenser endpoint"));
    }

    #[test]
    fn test_validate_proxy_path_must_be_relative() {
        let mut config = Config::default();
        config.dispenser.proxy_path = "api/open".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("proxy_path"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("local_storage.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_quota_none_when_zero() {
        let mut config = Config::default();
        config.storage.quota_bytes = 0;
        assert!(config.quota().is_none());
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.recognition_delay(), Duration::from_millis(1500));
        assert_eq!(config.dispenser_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("hospnav"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|_jail| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [dispenser]
                mode = "proxy"
                timeout_secs = 3

                [recognition]
                delay_ms = 0
                "#,
            )?;

            let path = jail.directory().join("config.toml");
            let config = Config::load_from(Some(path)).map_err(|e| e.to_string())?;
            assert_eq!(config.dispenser.mode, DispenserMode::Proxy);
            assert_eq!(config.dispenser.timeout_secs, 3);
            assert_eq!(config.recognition.delay_ms, 0);
            assert_eq!(config.recognition.min_confidence, 70);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [dispenser]
                mode = "direct"
                timeout_secs = 3
                "#,
            )?;
            jail.set_env("HOSPNAV_DISPENSER__MODE", "proxy");
            jail.set_env("HOSPNAV_RECOGNITION__DELAY_MS", "5");

            let path = jail.directory().join("config.toml");
            let config = Config::load_from(Some(path)).map_err(|e| e.to_string())?;
            assert_eq!(config.dispenser.mode, DispenserMode::Proxy);
            assert_eq!(config.dispenser.timeout_secs, 3);
            assert_eq!(config.recognition.delay_ms, 5);
            assert_eq!(config.dispenser.proxy_path, "/api/dispenser/open");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_value_fails_validation() {
        Jail::expect_with(|jail| {
            jail.set_env("HOSPNAV_RECOGNITION__MATCH_PROBABILITY", "2.0");

            let path = jail.directory().join("missing.toml");
            let err = Config::load_from(Some(path)).unwrap_err();
            assert!(matches!(err, Error::ConfigValidation { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_recognition_config_validate() {
        assert!(RecognitionConfig::default().validate().is_ok());

        let inverted = RecognitionConfig {
            min_confidence: 90,
            max_confidence: 80,
            ..RecognitionConfig::default()
        };
        assert!(matches!(
            inverted.validate().unwrap_err(),
            Error::ConfigValidation { .. }
        ));
    }

    #[test]
    fn test_dispenser_mode_serialize() {
        let json = serde_json::to_string(&DispenserMode::Proxy).unwrap();
        assert_eq!(json, "\"proxy\"");
    }
}
