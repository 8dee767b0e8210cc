//! Batched, strictly sequential loading of normalized rows.

use crate::error::{MigrateError, Result};
use crate::normalize::NormalizedRow;
use crate::schema::SchemaField;
use crate::target::TableStore;
use serde::Serialize;
use tracing::{debug, error};

/// Counters from a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Rows submitted across all batches.
    pub rows: usize,

    /// Number of insert calls issued.
    pub batches: usize,
}

/// Drives batched insertion against one destination table.
pub struct BatchLoader<'a> {
    store: &'a dyn TableStore,
    batch_size: usize,
}

impl<'a> BatchLoader<'a> {
    /// Create a loader. A zero batch size is a configuration error.
    pub fn new(store: &'a dyn TableStore, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(MigrateError::Config(
                "batch_size must be at least 1".into(),
            ));
        }
        Ok(Self { store, batch_size })
    }

    /// Insert `rows` into `dataset.table` in contiguous batches of at
    /// most `batch_size`, in order.
    ///
    /// Batches are submitted one at a time; a later batch is never
    /// sent before the previous insert has resolved. The first failed
    /// insert aborts the load: a partial failure propagates with its
    /// per-row detail, and nothing is retried or skipped, so a failed
    /// load leaves the table holding a prefix of the row set.
    pub async fn load(
        &self,
        dataset: &str,
        table: &str,
        schema: &[SchemaField],
        rows: &[NormalizedRow],
    ) -> Result<LoadStats> {
        let mut batches = 0;
        for (batch_index, batch) in rows.chunks(self.batch_size).enumerate() {
            debug!(
                "Inserting batch {} ({} rows) into {}.{}",
                batch_index,
                batch.len(),
                dataset,
                table
            );

            if let Err(e) = self.store.insert_batch(dataset, table, schema, batch).await {
                error!("Batch {} failed: {}", batch_index, e);
                if let Some(failures) = e.row_failures() {
                    for failure in failures {
                        error!(
                            "  rejected row {} ({}): {}",
                            failure.index, failure.insert_id, failure.message
                        );
                    }
                }
                return Err(e);
            }

            batches += 1;
        }

        Ok(LoadStats {
            rows: rows.len(),
            batches,
        })
    }
}
