//! Error types for the migration library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Detail for one row rejected during a partial insert failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// Zero-based position of the row within its batch.
    pub index: usize,

    /// The row's insert key (stringified document id).
    pub insert_id: String,

    /// Reason the destination rejected the row.
    pub message: String,
}

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (missing env vars, invalid YAML, zero batch size, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] mongodb::error::Error),

    /// Destination warehouse error
    #[error("Destination error: {0}")]
    Target(#[from] gcp_bigquery_client::error::BQError),

    /// Schema inference failed for a degenerate document set
    #[error("Schema inference failed: {0}")]
    SchemaInference(String),

    /// A document could not be normalized into a row
    #[error("Failed to normalize record: {0}")]
    Normalize(String),

    /// Deleting or recreating the destination table failed
    #[error("Failed to replace table {table}: {message}")]
    TableReplace { table: String, message: String },

    /// A whole batch was rejected by the destination
    #[error("Insert failed for table {table}: {message}")]
    Insert { table: String, message: String },

    /// The destination accepted part of a batch and rejected the rest
    #[error("Partial insert failure for table {table}: {} row(s) rejected", failures.len())]
    PartialInsert {
        table: String,
        failures: Vec<RowFailure>,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrateError {
    /// Create a Normalize error.
    pub fn normalize(message: impl Into<String>) -> Self {
        MigrateError::Normalize(message.into())
    }

    /// Create a TableReplace error.
    pub fn table_replace(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::TableReplace {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a generic Insert error.
    pub fn insert(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Insert {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Rows rejected in a partial insert failure, if this is one.
    pub fn row_failures(&self) -> Option<&[RowFailure]> {
        match self {
            MigrateError::PartialInsert { failures, .. } => Some(failures),
            _ => None,
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) => 2,
            MigrateError::Source(_) => 3,
            MigrateError::Target(_) | MigrateError::TableReplace { .. } => 4,
            MigrateError::Insert { .. } | MigrateError::PartialInsert { .. } => 5,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        if let MigrateError::PartialInsert { failures, .. } = self {
            for failure in failures {
                output.push_str(&format!(
                    "\n  row {} ({}): {}",
                    failure.index, failure.insert_id, failure.message
                ));
            }
        }

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_insert_display_counts_rows() {
        let err = MigrateError::PartialInsert {
            table: "events".to_string(),
            failures: vec![
                RowFailure {
                    index: 1,
                    insert_id: "a".to_string(),
                    message: "duplicate key".to_string(),
                },
                RowFailure {
                    index: 2,
                    insert_id: "b".to_string(),
                    message: "invalid".to_string(),
                },
            ],
        };
        assert!(err.to_string().contains("2 row(s) rejected"));
        assert_eq!(err.row_failures().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_format_detailed_lists_failed_rows() {
        let err = MigrateError::PartialInsert {
            table: "events".to_string(),
            failures: vec![RowFailure {
                index: 1,
                insert_id: "65a1".to_string(),
                message: "duplicate key".to_string(),
            }],
        };
        let detailed = err.format_detailed();
        assert!(detailed.contains("row 1 (65a1): duplicate key"));
    }

    #[test]
    fn test_whole_batch_rejection_is_an_insert_error() {
        let err = MigrateError::insert("events", "streaming quota exceeded");
        assert!(matches!(err, MigrateError::Insert { .. }));
        assert_eq!(err.exit_code(), 5);
        assert_eq!(
            err.to_string(),
            "Insert failed for table events: streaming quota exceeded"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), 2);
        assert_eq!(
            MigrateError::PartialInsert {
                table: "t".into(),
                failures: vec![]
            }
            .exit_code(),
            5
        );
    }
}
