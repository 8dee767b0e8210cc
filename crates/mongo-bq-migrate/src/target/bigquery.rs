//! BigQuery destination connector (streaming inserts).

use crate::config::TargetConfig;
use crate::error::{MigrateError, Result, RowFailure};
use crate::normalize::NormalizedRow;
use crate::schema::SchemaField;
use crate::target::TableStore;
use crate::typemap::TargetType;
use async_trait::async_trait;
use gcp_bigquery_client::model::table::Table;
use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;
use gcp_bigquery_client::model::table_field_schema::TableFieldSchema;
use gcp_bigquery_client::model::table_schema::TableSchema;
use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Table store backed by the BigQuery streaming insert API.
pub struct BigQueryStore {
    client: Client,
    project_id: String,
}

impl BigQueryStore {
    /// Connect using the configured service account key, or fall back
    /// to application default credentials.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let client = match &config.service_account_key {
            Some(path) => {
                Client::from_service_account_key_file(&path.to_string_lossy()).await?
            }
            None => Client::from_application_default_credentials().await?,
        };
        info!("Connected to BigQuery project '{}'", config.project_id);
        Ok(Self {
            client,
            project_id: config.project_id.clone(),
        })
    }
}

/// Build the BigQuery wire schema from inferred schema fields.
fn wire_schema(schema: &[SchemaField]) -> TableSchema {
    TableSchema::new(
        schema
            .iter()
            .map(|field| match field.field_type {
                TargetType::String => TableFieldSchema::string(&field.name),
                TargetType::Float => TableFieldSchema::float(&field.name),
                TargetType::Boolean => TableFieldSchema::bool(&field.name),
                TargetType::Timestamp => TableFieldSchema::timestamp(&field.name),
            })
            .collect(),
    )
}

/// Whether an API error means the requested resource does not exist,
/// as opposed to a transport or authorization failure.
fn is_not_found(err: &BQError) -> bool {
    message_indicates_not_found(&err.to_string())
}

fn message_indicates_not_found(message: &str) -> bool {
    message.contains("404") || message.to_lowercase().contains("not found")
}

/// Extract per-row rejections from an insertAll response body. The
/// wire payload carries a row index and a list of error protos per
/// rejected row.
fn partial_failures(response: &Value, rows: &[NormalizedRow]) -> Vec<RowFailure> {
    let Some(entries) = response.get("insertErrors").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .map(|entry| {
            let index = entry
                .get("index")
                .and_then(Value::as_u64)
                .unwrap_or_default() as usize;
            let message = entry
                .get("errors")
                .and_then(Value::as_array)
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|proto| proto.get("message").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join("; ")
                })
                .unwrap_or_default();
            RowFailure {
                index,
                insert_id: rows
                    .get(index)
                    .map(|row| row.insert_id.clone())
                    .unwrap_or_default(),
                message,
            }
        })
        .collect()
}

#[async_trait]
impl TableStore for BigQueryStore {
    async fn table_exists(&self, dataset: &str, table: &str) -> Result<bool> {
        match self
            .client
            .table()
            .get(&self.project_id, dataset, table, None)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_table(&self, dataset: &str, table: &str) -> Result<()> {
        self.client
            .table()
            .delete(&self.project_id, dataset, table)
            .await?;
        Ok(())
    }

    async fn create_table(
        &self,
        dataset: &str,
        table: &str,
        schema: &[SchemaField],
    ) -> Result<()> {
        self.client
            .table()
            .create(Table::new(
                &self.project_id,
                dataset,
                table,
                wire_schema(schema),
            ))
            .await?;
        debug!("Created table {}.{} ({} columns)", dataset, table, schema.len());
        Ok(())
    }

    async fn insert_batch(
        &self,
        dataset: &str,
        table: &str,
        _schema: &[SchemaField],
        rows: &[NormalizedRow],
    ) -> Result<()> {
        let mut request = TableDataInsertAllRequest::new();
        for row in rows {
            request.add_row(Some(row.insert_id.clone()), &row.payload)?;
        }

        let response = self
            .client
            .tabledata()
            .insert_all(&self.project_id, dataset, table, request)
            .await
            .map_err(|e| MigrateError::insert(table, e.to_string()))?;

        // A 2xx response can still reject individual rows, reported in
        // the insertErrors payload.
        let failures = partial_failures(&serde_json::to_value(&response)?, rows);
        if failures.is_empty() {
            return Ok(());
        }

        Err(MigrateError::PartialInsert {
            table: table.to_string(),
            failures,
        })
    }

    async fn ping(&self, dataset: &str) -> Result<()> {
        match self.client.dataset().get(&self.project_id, dataset).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Err(MigrateError::Config(format!(
                "dataset '{dataset}' does not exist in project '{}'",
                self.project_id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
