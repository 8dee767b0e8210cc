//! Pipeline integration tests driving the orchestrator and batch
//! loader against in-memory collaborators.

use async_trait::async_trait;
use mongo_bq_migrate::{
    BatchLoader, Config, DocumentSource, MigrateError, MigrationConfig, MigrationRequest,
    NormalizedRow, Orchestrator, RowFailure, SchemaField, SourceConfig, TableStore, TargetConfig,
};
use mongodb::bson::{doc, oid::ObjectId, Document};
use std::sync::{Arc, Mutex};

fn test_config(batch_size: usize) -> Config {
    Config {
        source: SourceConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "appdata".to_string(),
        },
        target: TargetConfig {
            project_id: "test-project".to_string(),
            dataset_id: "analytics".to_string(),
            service_account_key: None,
        },
        migration: MigrationConfig { batch_size },
    }
}

/// In-memory document source serving a fixed snapshot.
struct FakeSource {
    documents: Vec<Document>,
}

#[async_trait]
impl DocumentSource for FakeSource {
    async fn fetch_all(&self, _collection: &str) -> mongo_bq_migrate::Result<Vec<Document>> {
        Ok(self.documents.clone())
    }

    async fn ping(&self) -> mongo_bq_migrate::Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}

/// Events recorded by the fake store, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreCall {
    Exists,
    Delete,
    Create { columns: usize },
    Insert { insert_ids: Vec<String> },
}

/// In-memory table store that records every call and can reject one
/// insert id with a given cause.
struct FakeStore {
    exists: bool,
    reject: Option<(String, String)>,
    calls: Mutex<Vec<StoreCall>>,
}

impl FakeStore {
    fn new(exists: bool) -> Self {
        Self {
            exists,
            reject: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn rejecting(exists: bool, insert_id: &str, cause: &str) -> Self {
        Self {
            reject: Some((insert_id.to_string(), cause.to_string())),
            ..Self::new(exists)
        }
    }

    fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    fn insert_batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Insert { insert_ids } => Some(insert_ids),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TableStore for FakeStore {
    async fn table_exists(&self, _dataset: &str, _table: &str) -> mongo_bq_migrate::Result<bool> {
        self.calls.lock().unwrap().push(StoreCall::Exists);
        Ok(self.exists)
    }

    async fn delete_table(&self, _dataset: &str, _table: &str) -> mongo_bq_migrate::Result<()> {
        self.calls.lock().unwrap().push(StoreCall::Delete);
        Ok(())
    }

    async fn create_table(
        &self,
        _dataset: &str,
        _table: &str,
        schema: &[SchemaField],
    ) -> mongo_bq_migrate::Result<()> {
        self.calls.lock().unwrap().push(StoreCall::Create {
            columns: schema.len(),
        });
        Ok(())
    }

    async fn insert_batch(
        &self,
        _dataset: &str,
        table: &str,
        _schema: &[SchemaField],
        rows: &[NormalizedRow],
    ) -> mongo_bq_migrate::Result<()> {
        self.calls.lock().unwrap().push(StoreCall::Insert {
            insert_ids: rows.iter().map(|row| row.insert_id.clone()).collect(),
        });

        if let Some((insert_id, cause)) = &self.reject {
            if let Some(index) = rows.iter().position(|row| &row.insert_id == insert_id) {
                return Err(MigrateError::PartialInsert {
                    table: table.to_string(),
                    failures: vec![RowFailure {
                        index,
                        insert_id: insert_id.clone(),
                        message: cause.clone(),
                    }],
                });
            }
        }
        Ok(())
    }

    async fn ping(&self, _dataset: &str) -> mongo_bq_migrate::Result<()> {
        Ok(())
    }
}

fn snapshot(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            doc! {
                "_id": ObjectId::new(),
                "seq": i as f64,
                "name": format!("doc-{i}"),
            }
        })
        .collect()
}

fn orchestrator(
    batch_size: usize,
    documents: Vec<Document>,
    store: Arc<FakeStore>,
) -> Orchestrator {
    Orchestrator::with_collaborators(
        test_config(batch_size),
        Arc::new(FakeSource { documents }),
        store,
    )
}

fn request() -> MigrationRequest {
    MigrationRequest {
        collection: "orders".to_string(),
        table: "orders".to_string(),
    }
}

#[tokio::test]
async fn end_to_end_250_documents_in_3_batches() {
    let documents = snapshot(250);
    let expected_ids: Vec<String> = documents
        .iter()
        .map(|d| d.get_object_id("_id").unwrap().to_hex())
        .collect();

    let store = Arc::new(FakeStore::new(true));
    let result = orchestrator(100, documents, store.clone())
        .run(request())
        .await
        .unwrap();

    assert_eq!(result.status, "completed");
    assert_eq!(result.documents_read, 250);
    assert_eq!(result.rows_loaded, 250);
    assert_eq!(result.batches, 3);
    assert_eq!(result.columns, 3);

    // Exactly one delete, before the create and before any insert.
    let calls = store.calls();
    let deletes = calls.iter().filter(|c| **c == StoreCall::Delete).count();
    assert_eq!(deletes, 1);
    assert_eq!(calls[0], StoreCall::Exists);
    assert_eq!(calls[1], StoreCall::Delete);
    assert_eq!(calls[2], StoreCall::Create { columns: 3 });

    // Batch sizes 100/100/50, order preserved within and across.
    let batches = store.insert_batches();
    let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    let replayed: Vec<String> = batches.into_iter().flatten().collect();
    assert_eq!(replayed, expected_ids);
}

#[tokio::test]
async fn missing_table_skips_the_delete() {
    let store = Arc::new(FakeStore::new(false));
    orchestrator(100, snapshot(5), store.clone())
        .run(request())
        .await
        .unwrap();

    let calls = store.calls();
    assert!(!calls.contains(&StoreCall::Delete));
    assert_eq!(calls[1], StoreCall::Create { columns: 3 });
}

#[tokio::test]
async fn empty_collection_succeeds_without_creating_a_table() {
    let store = Arc::new(FakeStore::new(true));
    let result = orchestrator(100, Vec::new(), store.clone())
        .run(request())
        .await
        .unwrap();

    assert_eq!(result.rows_loaded, 0);
    assert_eq!(result.batches, 0);
    assert_eq!(result.columns, 0);

    // The replace step still deletes the stale table, but with no
    // schema there is nothing to create or insert.
    let calls = store.calls();
    assert_eq!(calls, vec![StoreCall::Exists, StoreCall::Delete]);
}

#[tokio::test]
async fn partial_failure_reports_the_rejected_row() {
    let documents = snapshot(3);
    let rejected_id = documents[1].get_object_id("_id").unwrap().to_hex();

    let store = Arc::new(FakeStore::rejecting(true, &rejected_id, "duplicate key"));
    let err = orchestrator(100, documents, store.clone())
        .run(request())
        .await
        .unwrap_err();

    match err {
        MigrateError::PartialInsert { table, failures } => {
            assert_eq!(table, "orders");
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].index, 1);
            assert_eq!(failures[0].insert_id, rejected_id);
            assert_eq!(failures[0].message, "duplicate key");
        }
        other => panic!("expected PartialInsert, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_batch_stops_later_batches() {
    let documents = snapshot(5);
    // Rejected id sits in the second batch of two rows.
    let rejected_id = documents[3].get_object_id("_id").unwrap().to_hex();

    let store = Arc::new(FakeStore::rejecting(true, &rejected_id, "invalid"));
    let err = orchestrator(2, documents, store.clone())
        .run(request())
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::PartialInsert { .. }));
    // Batch 0 succeeded, batch 1 failed, batch 2 was never sent.
    assert_eq!(store.insert_batches().len(), 2);
}

#[tokio::test]
async fn loader_partitions_exactly() {
    let store = FakeStore::new(true);
    let schema = vec![SchemaField {
        name: "seq".to_string(),
        field_type: mongo_bq_migrate::TargetType::Float,
    }];
    let rows: Vec<NormalizedRow> = snapshot(10)
        .iter()
        .map(|d| mongo_bq_migrate::normalize::normalize(d).unwrap())
        .collect();

    let loader = BatchLoader::new(&store, 3).unwrap();
    let stats = loader
        .load("analytics", "orders", &schema, &rows)
        .await
        .unwrap();

    assert_eq!(stats.rows, 10);
    assert_eq!(stats.batches, 4);
    let sizes: Vec<usize> = store.insert_batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 3, 3, 1]);
}

#[tokio::test]
async fn zero_batch_size_is_a_configuration_error() {
    let store = FakeStore::new(true);
    let err = BatchLoader::new(&store, 0).err().unwrap();
    assert!(matches!(err, MigrateError::Config(_)));
}

#[tokio::test]
async fn malformed_document_aborts_the_run() {
    let store = Arc::new(FakeStore::new(true));
    let documents = vec![doc! { "name": "no-id" }];
    let err = orchestrator(100, documents, store.clone())
        .run(request())
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::Normalize(_)));
    // Normalization fails before the table is touched.
    assert!(store.calls().is_empty());
}
