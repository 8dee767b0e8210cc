//! MongoDB source connector.

use crate::config::SourceConfig;
use crate::error::Result;
use crate::source::DocumentSource;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Database};
use tracing::{debug, info};

/// Document source backed by a MongoDB database.
pub struct MongoSource {
    client: Client,
    database: Database,
}

impl MongoSource {
    /// Connect to the configured MongoDB deployment.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.uri).await?;
        let database = client.database(&config.database);
        info!("Connected to MongoDB database '{}'", config.database);
        Ok(Self { client, database })
    }
}

#[async_trait]
impl DocumentSource for MongoSource {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>> {
        let cursor = self
            .database
            .collection::<Document>(collection)
            .find(None, None)
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        debug!(
            "Fetched {} documents from collection '{}'",
            documents.len(),
            collection
        );
        Ok(documents)
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        debug!("MongoDB connection closed");
    }
}
