use std::collections::BTreeMap;
use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::dialect::normalize_dialect;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Library and CLI configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedframeConfig {
    /// Dialect used when none is given on the command line
    #[validate(length(min = 1, message = "Default dialect cannot be empty"))]
    pub default_dialect: String,

    /// Model catalog (YAML) to load
    pub catalog_path: Option<String>,

    /// Reject tables with columns the model does not declare
    pub strict_columns: bool,

    /// Inject named index values when parsing
    pub parse_index: bool,

    /// Default log filter (error, warn, info, debug, trace, off)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Extra dialect identifiers mapped onto an existing dialect, e.g. `postgres: postgresql`
    pub dialect_aliases: BTreeMap<String, String>,
}

impl Default for RedframeConfig {
    fn default() -> Self {
        Self {
            default_dialect: "sqlite".to_string(),
            catalog_path: None,
            strict_columns: false,
            parse_index: false,
            log_level: "info".to_string(),
            dialect_aliases: BTreeMap::new(),
        }
    }
}

impl RedframeConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            default_dialect: env::var("REDFRAME_DIALECT").unwrap_or_else(|_| "sqlite".to_string()),
            catalog_path: env::var("REDFRAME_CATALOG").ok(),
            strict_columns: parse_env_var("REDFRAME_STRICT_COLUMNS", "false")?,
            parse_index: parse_env_var("REDFRAME_PARSE_INDEX", "false")?,
            log_level: env::var("REDFRAME_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dialect_aliases: parse_aliases(
                &env::var("REDFRAME_DIALECT_ALIASES").unwrap_or_default(),
            )?,
        };

        config.check()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.check()?;
        Ok(config)
    }

    /// Field validation plus the checks `validator` can't express
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.log_filter()?;
        Ok(())
    }

    /// Target of `dialect` when it is a configured alias. Matching ignores case.
    pub fn alias_target(&self, dialect: &str) -> Option<&str> {
        let key = normalize_dialect(dialect);
        self.dialect_aliases
            .iter()
            .find(|(alias, _)| normalize_dialect(alias) == key)
            .map(|(_, target)| target.as_str())
    }

    pub fn log_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|e| ConfigError::Parse {
                field: "log_level".to_string(),
                value: self.log_level.clone(),
                source: Box::new(e),
            })
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

/// `alias=dialect,alias=dialect`
fn parse_aliases(value: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((alias, target)) if !alias.trim().is_empty() && !target.trim().is_empty() => {
                Ok((alias.trim().to_string(), target.trim().to_string()))
            }
            _ => Err(ConfigError::Parse {
                field: "REDFRAME_DIALECT_ALIASES".to_string(),
                value: pair.to_string(),
                source: "expected alias=dialect".into(),
            }),
        })
        .collect()
}
