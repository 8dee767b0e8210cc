//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from process environment variables.
    ///
    /// Honors the deployment variables `MONGODB_URI`,
    /// `MONGODB_DATABASE_NAME`, `BIGQUERY_PROJECT_ID`,
    /// `BIGQUERY_DATASET_ID` and optionally `BATCH_INSERT_SIZE`.
    pub fn from_env() -> Result<Self> {
        let batch_size = match std::env::var("BATCH_INSERT_SIZE") {
            Ok(raw) => raw.parse::<usize>().map_err(|_| {
                MigrateError::Config(format!(
                    "BATCH_INSERT_SIZE must be a positive integer, got '{raw}'"
                ))
            })?,
            Err(_) => MigrationConfig::default().batch_size,
        };

        let config = Config {
            source: SourceConfig {
                uri: require_env("MONGODB_URI")?,
                database: require_env("MONGODB_DATABASE_NAME")?,
            },
            target: TargetConfig {
                project_id: require_env("BIGQUERY_PROJECT_ID")?,
                dataset_id: require_env("BIGQUERY_DATASET_ID")?,
                service_account_key: std::env::var("GOOGLE_APPLICATION_CREDENTIALS")
                    .ok()
                    .map(Into::into),
            },
            migration: MigrationConfig { batch_size },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| MigrateError::Config(format!("environment variable {name} is not set")))
}
