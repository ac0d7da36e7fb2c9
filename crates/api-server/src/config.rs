//! Server configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (TASKS_*)
//! 2. TOML config file (if TASKS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use task_core::cache::CacheTtl;
use task_core::pagination::PageLimits;

/// Path value that selects an in-memory database
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file, or `:memory:`
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Seconds a cached task list lives after it was stored
    #[serde(default = "default_cache_absolute_ttl_secs")]
    pub cache_absolute_ttl_secs: u64,

    /// Seconds a cached task list lives after it was last read
    #[serde(default = "default_cache_idle_ttl_secs")]
    pub cache_idle_ttl_secs: u64,

    #[serde(default = "default_items_per_page")]
    pub default_items_per_page: usize,

    #[serde(default = "default_max_items_per_page")]
    pub max_items_per_page: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tasks.sqlite")
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5101))
}

fn default_cache_absolute_ttl_secs() -> u64 {
    300
}

fn default_cache_idle_ttl_secs() -> u64 {
    120
}

fn default_items_per_page() -> usize {
    PageLimits::default().default_items_per_page
}

fn default_max_items_per_page() -> usize {
    PageLimits::default().max_items_per_page
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            cache_absolute_ttl_secs: default_cache_absolute_ttl_secs(),
            cache_idle_ttl_secs: default_cache_idle_ttl_secs(),
            default_items_per_page: default_items_per_page(),
            max_items_per_page: default_max_items_per_page(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional TOML file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TASKS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::prefixed("TASKS_").ignore(&["config_file"]));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(invalid("db_path", "must not be empty"));
        }
        if self.cache_absolute_ttl_secs == 0 {
            return Err(invalid("cache_absolute_ttl_secs", "must be greater than 0"));
        }
        if self.cache_idle_ttl_secs == 0 {
            return Err(invalid("cache_idle_ttl_secs", "must be greater than 0"));
        }
        if self.cache_idle_ttl_secs > self.cache_absolute_ttl_secs {
            return Err(invalid(
                "cache_idle_ttl_secs",
                "must not exceed cache_absolute_ttl_secs",
            ));
        }
        if self.max_items_per_page == 0 {
            return Err(invalid("max_items_per_page", "must be greater than 0"));
        }
        if self.default_items_per_page == 0 || self.default_items_per_page > self.max_items_per_page {
            return Err(invalid(
                "default_items_per_page",
                "must be between 1 and max_items_per_page",
            ));
        }
        Ok(())
    }

    pub fn uses_in_memory_db(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_DB
    }

    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            absolute: Duration::from_secs(self.cache_absolute_ttl_secs),
            idle: Duration::from_secs(self.cache_idle_ttl_secs),
        }
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_items_per_page: self.default_items_per_page,
            max_items_per_page: self.max_items_per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("tasks.sqlite"));
        assert_eq!(config.bind_addr.port(), 5101);
        assert_eq!(config.cache_ttl(), CacheTtl::default());
        assert_eq!(config.page_limits(), PageLimits::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_in_memory_db_detection() {
        let config = AppConfig {
            db_path: PathBuf::from(IN_MEMORY_DB),
            ..Default::default()
        };
        assert!(config.uses_in_memory_db());
        assert!(!AppConfig::default().uses_in_memory_db());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig {
            cache_absolute_ttl_secs: 0,
            ..Default::default()
        };
        let result = config.validate();
        assert!(
            matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_absolute_ttl_secs")
        );
    }

    #[test]
    fn test_validate_idle_longer_than_absolute() {
        let config = AppConfig {
            cache_absolute_ttl_secs: 60,
            cache_idle_ttl_secs: 120,
            ..Default::default()
        };
        let result = config.validate();
        assert!(
            matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_idle_ttl_secs")
        );
    }

    #[test]
    fn test_validate_default_page_size_above_max() {
        let config = AppConfig {
            default_items_per_page: 50,
            max_items_per_page: 20,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extract_from_toml() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(
                r#"
                db_path = "data/tasks.sqlite"
                cache_idle_ttl_secs = 30
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.db_path, PathBuf::from("data/tasks.sqlite"));
        assert_eq!(config.cache_idle_ttl_secs, 30);
        assert_eq!(config.cache_absolute_ttl_secs, 300);
    }
}
