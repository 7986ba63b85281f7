//! MongoDB-backed document store.

use super::{DocumentStore, StoreBackend, StoreConnection, namespace};
use crate::error::{Error, Result, StoreError};
use crate::types::SampleRecord;
use async_trait::async_trait;
use mongodb::Client;
use mongodb::bson::doc;
use tracing::debug;

/// Document store writing to a MongoDB deployment
///
/// Accepts `mongodb://` and `mongodb+srv://` connection strings. Credentials
/// in the URI are never logged.
#[derive(Clone)]
pub struct MongoDocumentStore {
    uri: String,
}

impl MongoDocumentStore {
    /// Create a store for a MongoDB connection string
    ///
    /// No client is built here; [`MongoDocumentStore::open`] connects.
    pub fn new(uri: &str) -> Result<Self> {
        if StoreBackend::from_uri(uri)? != StoreBackend::MongoDb {
            return Err(Error::Store(StoreError::ConnectionFailed(
                "MongoDB store requires a mongodb:// or mongodb+srv:// URI".to_string(),
            )));
        }

        Ok(Self {
            uri: uri.to_string(),
        })
    }

    /// Build a client and check that the deployment answers
    pub async fn open(&self) -> Result<MongoStoreConnection> {
        let client = Client::with_uri_str(&self.uri).await.map_err(|e| {
            Error::Store(StoreError::ConnectionFailed(format!(
                "Failed to create MongoDB client: {}",
                e
            )))
        })?;

        // Client creation is lazy; ping so an unreachable server fails here
        if let Err(e) = client.database("admin").run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(Error::Store(StoreError::ConnectionFailed(format!(
                "Failed to reach MongoDB: {}",
                e
            ))));
        }

        Ok(MongoStoreConnection {
            client: Some(client),
        })
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>> {
        Ok(Box::new(self.open().await?))
    }
}

/// An open MongoDB client
///
/// The client is shut down by [`StoreConnection::close`] and dropped with the
/// connection otherwise.
pub struct MongoStoreConnection {
    client: Option<Client>,
}

impl MongoStoreConnection {
    fn client(&self) -> Result<&Client> {
        self.client.as_ref().ok_or_else(|| {
            Error::Store(StoreError::ConnectionFailed(
                "Connection already closed".to_string(),
            ))
        })
    }
}

#[async_trait]
impl StoreConnection for MongoStoreConnection {
    async fn insert_many(
        &mut self,
        database: &str,
        collection: &str,
        documents: &[SampleRecord],
    ) -> Result<u64> {
        namespace(database, collection)?;
        let client = self.client()?;
        // The server rejects an empty insert_many
        if documents.is_empty() {
            return Ok(0);
        }
        debug!(
            "Inserting {} documents into {}.{}",
            documents.len(),
            database,
            collection
        );

        let target = client
            .database(database)
            .collection::<SampleRecord>(collection);
        let result = target.insert_many(documents).await.map_err(|e| {
            Error::Store(StoreError::WriteFailed(format!(
                "Failed to insert into {}.{}: {}",
                database, collection, e
            )))
        })?;

        Ok(result.inserted_ids.len() as u64)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
        }
        Ok(())
    }
}
