//! Source document store abstraction and the MongoDB implementation.

mod mongo;

pub use mongo::MongoSource;

use crate::error::Result;
use async_trait::async_trait;
use mongodb::bson::Document;

/// Read a full snapshot of documents from the source store.
///
/// The core pipeline only ever sees this trait; tests supply in-memory
/// implementations.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch every document in a collection as one materialized
    /// snapshot. No pagination cursor is exposed to the caller.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>>;

    /// Check connectivity.
    async fn ping(&self) -> Result<()>;

    /// Release the underlying connection.
    async fn close(&self);
}
