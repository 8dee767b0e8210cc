//! # mongo-bq-migrate
//!
//! MongoDB collection to BigQuery table migration library.
//!
//! This library migrates a full snapshot of schema-less documents into
//! a columnar BigQuery table with an explicit schema:
//!
//! - **Schema inference** from the union of all document fields, typed
//!   from each field's first sampled value
//! - **Record normalization** into the streaming-insert wire format
//!   (ObjectId ids as strings, datetimes as epoch seconds, nested
//!   structures as JSON text)
//! - **Batched loading** with deterministic insert keys and per-row
//!   partial-failure reporting
//! - **Full table replacement** (drop-if-exists, recreate) per run
//!
//! ## Example
//!
//! ```rust,no_run
//! use mongo_bq_migrate::{Config, MigrationRequest, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> mongo_bq_migrate::Result<()> {
//!     let config = Config::from_env()?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator
//!         .run(MigrationRequest {
//!             collection: "orders".to_string(),
//!             table: "orders".to_string(),
//!         })
//!         .await?;
//!     println!("Loaded {} rows", result.rows_loaded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod orchestrator;
pub mod schema;
pub mod source;
pub mod target;
pub mod typemap;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use error::{MigrateError, Result, RowFailure};
pub use loader::{BatchLoader, LoadStats};
pub use normalize::NormalizedRow;
pub use orchestrator::{HealthCheckResult, MigrationRequest, MigrationResult, Orchestrator};
pub use schema::SchemaField;
pub use source::{DocumentSource, MongoSource};
pub use target::{BigQueryStore, TableStore};
pub use typemap::TargetType;
