//! Destination table store abstraction and the BigQuery implementation.

mod bigquery;

pub use bigquery::BigQueryStore;

use crate::error::Result;
use crate::normalize::NormalizedRow;
use crate::schema::SchemaField;
use async_trait::async_trait;

/// Write capability against the destination warehouse.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Whether the table currently exists in the dataset.
    async fn table_exists(&self, dataset: &str, table: &str) -> Result<bool>;

    /// Delete the table. The table must exist.
    async fn delete_table(&self, dataset: &str, table: &str) -> Result<()>;

    /// Create the table with an explicit column schema.
    async fn create_table(&self, dataset: &str, table: &str, schema: &[SchemaField])
        -> Result<()>;

    /// Insert one batch of rows, keyed by each row's insert id.
    ///
    /// Returns `MigrateError::PartialInsert` when the destination
    /// accepts part of the batch and rejects the rest, with one
    /// `RowFailure` per rejected row.
    async fn insert_batch(
        &self,
        dataset: &str,
        table: &str,
        schema: &[SchemaField],
        rows: &[NormalizedRow],
    ) -> Result<()>;

    /// Check connectivity (dataset reachable).
    async fn ping(&self, dataset: &str) -> Result<()>;
}
