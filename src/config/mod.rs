//! Configuration loading and management

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Page size defaults for list endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Settings for library synchronization runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Records requested per remote page
    pub page_size: u32,
    /// Stop paging once this many records were fetched
    pub max_items: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_items: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "dashspot=info".to_string(),
        }
    }
}

/// Replacement key lists for one resource's filter registry
///
/// Omitted lists keep the built-in declaration. Every listed key must still
/// have a handler, otherwise building the registry fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterFieldsConfig {
    #[serde(default)]
    pub filter_fields: Option<Vec<String>>,
    #[serde(default)]
    pub search_fields: Option<Vec<String>>,
    #[serde(default)]
    pub sort_fields: Option<Vec<String>>,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub pagination: PaginationConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
    /// Keyed by resource name (`playlists`, `tracks`, `albums`, `artists`)
    pub filters: BTreeMap<String, FilterFieldsConfig>,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::IoError {
                message: e.to_string(),
            },
        })?;

        Self::parse(&content, Some(path.display().to_string()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, file: Option<String>) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.default_page_size == 0 {
            return Err(invalid("pagination.default_page_size", "0", "must be at least 1"));
        }
        if self.pagination.max_page_size < self.pagination.default_page_size {
            return Err(invalid(
                "pagination.max_page_size",
                &self.pagination.max_page_size.to_string(),
                "must not be smaller than default_page_size",
            ));
        }
        if self.sync.page_size == 0 {
            return Err(invalid("sync.page_size", "0", "must be at least 1"));
        }
        Ok(())
    }

    /// Override for one resource, if configured
    pub fn filter_fields(&self, resource: &str) -> Option<&FilterFieldsConfig> {
        self.filters.get(resource)
    }
}

fn invalid(field: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` wins over the configured directive. Calling this twice is
/// harmless; the second call is ignored.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.pagination.max_page_size, 100);
        assert_eq!(config.sync.page_size, 50);
        assert!(config.filters.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = AppConfig::default();
        config.filters.insert(
            "albums".to_string(),
            FilterFieldsConfig {
                sort_fields: Some(vec!["name".to_string()]),
                ..Default::default()
            },
        );
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = AppConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = AppConfig::from_yaml_str("pagination:\n  max_page_size: 250\n").unwrap();
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.pagination.max_page_size, 250);
        assert_eq!(config.logging.filter, "dashspot=info");
    }

    #[test]
    fn test_invalid_page_sizes_rejected() {
        let err = AppConfig::from_yaml_str("pagination:\n  default_page_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = AppConfig::from_yaml_str(
            "pagination:\n  default_page_size: 50\n  max_page_size: 10\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
