//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.uri.is_empty() {
        return Err(MigrateError::Config("source.uri is required".into()));
    }
    if !config.source.uri.starts_with("mongodb://") && !config.source.uri.starts_with("mongodb+srv://")
    {
        return Err(MigrateError::Config(format!(
            "source.uri must be a mongodb:// or mongodb+srv:// URI, got '{}'",
            config.source.uri
        )));
    }
    if config.source.database.is_empty() {
        return Err(MigrateError::Config("source.database is required".into()));
    }

    // Target validation
    if config.target.project_id.is_empty() {
        return Err(MigrateError::Config("target.project_id is required".into()));
    }
    if config.target.dataset_id.is_empty() {
        return Err(MigrateError::Config("target.dataset_id is required".into()));
    }

    // A zero batch size is a configuration error, never a silent fallback.
    if config.migration.batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }

    Ok(())
}
