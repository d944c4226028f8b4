//! Runtime settings
//!
//! Settings are read from `MONOPOLY_*` environment variables (after an
//! optional `.env` file has been loaded by the binary). Every field has a
//! default, so an empty environment yields a usable local configuration.

use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

/// Settings for the data-access layer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// PostgreSQL connection string
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub idle_timeout_secs: u64,
    /// Per-statement timeout; unset means no limit
    pub statement_timeout_ms: Option<u64>,
    /// Upper bound applied to requested page sizes
    pub max_page_size: u32,
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/monopoly".to_string(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 30,
            max_lifetime_secs: 30 * 60,
            idle_timeout_secs: 10 * 60,
            statement_timeout_ms: None,
            max_page_size: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `MONOPOLY_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_builder(
            config::Config::builder()
                .add_source(Environment::with_prefix("MONOPOLY").try_parsing(true)),
        )
    }

    pub(crate) fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Message(
                "max_page_size must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Message(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Message(
                "min_connections exceeds max_connections".to_string(),
            ));
        }
        Ok(())
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::from_builder(config::Config::builder()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.statement_timeout(), None);
    }

    #[test]
    fn test_overrides() {
        let builder = config::Config::builder()
            .set_override("max_page_size", 50i64)
            .unwrap()
            .set_override("statement_timeout_ms", 250i64)
            .unwrap();
        let settings = Settings::from_builder(builder).unwrap();
        assert_eq!(settings.max_page_size, 50);
        assert_eq!(settings.statement_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let builder = config::Config::builder()
            .set_override("default_page_size", 500i64)
            .unwrap();
        assert_eq!(Settings::from_builder(builder).unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        for (key, value) in [
            ("max_page_size", 0i64),
            ("max_connections", 0),
            ("min_connections", 50),
        ] {
            let builder = config::Config::builder().set_override(key, value).unwrap();
            assert!(Settings::from_builder(builder).is_err(), "{} = {}", key, value);
        }
    }
}
