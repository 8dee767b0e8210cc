//! Migration orchestrator - main workflow coordinator.

use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::loader::BatchLoader;
use crate::normalize::{self, NormalizedRow};
use crate::schema::{self, SchemaField};
use crate::source::{DocumentSource, MongoSource};
use crate::target::{BigQueryStore, TableStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One migration request: which collection to read and which table to
/// (re)create and load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRequest {
    /// Source collection name.
    pub collection: String,

    /// Destination table name within the configured dataset.
    pub table: String,
}

/// Result of a completed migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status (always "completed"; failures propagate as errors).
    pub status: String,

    /// Source collection.
    pub collection: String,

    /// Destination table.
    pub table: String,

    /// Documents read from the source snapshot.
    pub documents_read: usize,

    /// Columns in the inferred schema.
    pub columns: usize,

    /// Rows loaded into the destination.
    pub rows_loaded: usize,

    /// Insert calls issued.
    pub batches: usize,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Health probe outcome for both collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_error: Option<String>,
}

impl HealthCheckResult {
    pub fn is_healthy(&self) -> bool {
        self.source_connected && self.target_connected
    }
}

/// Migration orchestrator.
///
/// Holds no state across runs; each `run` operates on one request and
/// either completes fully or fails with the causing error.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn TableStore>,
}

impl Orchestrator {
    /// Create an orchestrator connected to the configured MongoDB
    /// deployment and BigQuery project.
    pub async fn new(config: Config) -> Result<Self> {
        let source = MongoSource::connect(&config.source).await?;
        let store = BigQueryStore::connect(&config.target).await?;
        Ok(Self {
            config,
            source: Arc::new(source),
            store: Arc::new(store),
        })
    }

    /// Create an orchestrator over explicit collaborators.
    pub fn with_collaborators(
        config: Config,
        source: Arc<dyn DocumentSource>,
        store: Arc<dyn TableStore>,
    ) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    /// Run one migration.
    ///
    /// Phases run strictly forward: fetch, infer, normalize, replace
    /// table, load. Any failure aborts the run immediately; there is
    /// no retry between phases.
    pub async fn run(&self, request: MigrationRequest) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let dataset = self.config.target.dataset_id.clone();

        info!(
            "Starting migration run {}: collection '{}' -> {}.{}",
            run_id, request.collection, dataset, request.table
        );

        // Phase 1: Fetch the full snapshot
        info!("Phase 1: Fetching documents from '{}'", request.collection);
        let documents = self.source.fetch_all(&request.collection).await?;
        self.source.close().await;
        info!("Fetched {} documents", documents.len());

        // Phase 2: Infer the destination schema
        info!("Phase 2: Inferring schema");
        let schema = schema::infer_schema(&documents)?;
        info!("Inferred {} columns", schema.len());

        // Phase 3: Normalize records
        info!("Phase 3: Normalizing records");
        let rows: Vec<NormalizedRow> = documents
            .iter()
            .map(normalize::normalize)
            .collect::<Result<_>>()?;
        drop(documents);

        // Phase 4: Replace the destination table
        info!("Phase 4: Replacing table {}.{}", dataset, request.table);
        self.replace_table(&dataset, &request.table, &schema).await?;

        // Phase 5: Load rows in batches
        info!(
            "Phase 5: Loading {} rows (batch size {})",
            rows.len(),
            self.config.migration.batch_size
        );
        let loader = BatchLoader::new(self.store.as_ref(), self.config.migration.batch_size)?;
        let stats = loader
            .load(&dataset, &request.table, &schema, &rows)
            .await?;

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let result = MigrationResult {
            run_id,
            status: "completed".to_string(),
            collection: request.collection,
            table: request.table,
            documents_read: rows.len(),
            columns: schema.len(),
            rows_loaded: stats.rows,
            batches: stats.batches,
            duration_seconds: duration,
            started_at,
            completed_at,
        };

        info!(
            "Migration {}: {} rows in {} batches in {:.1}s",
            result.status, result.rows_loaded, result.batches, result.duration_seconds
        );

        Ok(result)
    }

    /// Delete the destination table if it exists, then create it fresh
    /// with the inferred schema. The delete always completes before
    /// any insert is attempted.
    async fn replace_table(
        &self,
        dataset: &str,
        table: &str,
        schema: &[SchemaField],
    ) -> Result<()> {
        let exists = self
            .store
            .table_exists(dataset, table)
            .await
            .map_err(|e| MigrateError::table_replace(table, e.to_string()))?;

        if exists {
            self.store
                .delete_table(dataset, table)
                .await
                .map_err(|e| MigrateError::table_replace(table, e.to_string()))?;
            info!("Deleted existing table: {}.{}", dataset, table);
        }

        if schema.is_empty() {
            // Nothing to load; creating a table with no columns would
            // be rejected by the destination.
            warn!("Empty schema for {}.{}; skipping table creation", dataset, table);
            return Ok(());
        }

        self.store
            .create_table(dataset, table, schema)
            .await
            .map_err(|e| MigrateError::table_replace(table, e.to_string()))?;
        info!("Created table {}.{} ({} columns)", dataset, table, schema.len());

        Ok(())
    }

    /// Probe both collaborators.
    pub async fn health_check(&self) -> HealthCheckResult {
        let source = self.source.ping().await;
        let target = self.store.ping(&self.config.target.dataset_id).await;

        HealthCheckResult {
            source_connected: source.is_ok(),
            source_error: source.err().map(|e| e.to_string()),
            target_connected: target.is_ok(),
            target_error: target.err().map(|e| e.to_string()),
        }
    }
}
