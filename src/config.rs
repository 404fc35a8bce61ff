use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

use crate::attribute_index::JoinStrategy;

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

/// Schema compiler configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Key column assumed for associations that do not name one
    #[validate(length(min = 1, message = "Default primary key cannot be empty"))]
    pub default_primary_key: String,

    /// How join keys are folded into the joined header
    pub join_strategy: JoinStrategy,

    /// Check header invariants after every join, also in release builds
    pub verify_invariants: bool,

    /// Upper bound on associations compiled from a single schema
    #[validate(range(
        min = 1,
        max = 100000,
        message = "Max associations must be between 1 and 100000"
    ))]
    pub max_associations: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_primary_key: "id".to_string(),
            join_strategy: JoinStrategy::Natural,
            verify_invariants: true,
            max_associations: 1000,
        }
    }
}

impl CompilerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            default_primary_key: env::var("RELMAP_DEFAULT_PRIMARY_KEY")
                .unwrap_or_else(|_| "id".to_string()),
            join_strategy: parse_env_var("RELMAP_JOIN_STRATEGY", "natural")?,
            verify_invariants: parse_env_var("RELMAP_VERIFY_INVARIANTS", "true")?,
            max_associations: parse_env_var("RELMAP_MAX_ASSOCIATIONS", "1000")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            default_primary_key: cli.default_primary_key,
            join_strategy: cli.join_strategy,
            verify_invariants: cli.verify_invariants,
            max_associations: cli.max_associations,
        };

        config.validate()?;
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

        config.validate()?;
        Ok(config)
    }

    /// Merge with another configuration (CLI overrides environment)
    pub fn merge(&mut self, other: Self) {
        self.default_primary_key = other.default_primary_key;
        self.join_strategy = other.join_strategy;
        self.verify_invariants = other.verify_invariants;
        self.max_associations = other.max_associations;
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub default_primary_key: String,
    pub join_strategy: JoinStrategy,
    pub verify_invariants: bool,
    pub max_associations: usize,
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
