//! Bulk loading of parsed records into the document store

use crate::config::StoreConfig;
use crate::error::Result;
use crate::store::DocumentStore;
use crate::types::SampleRecord;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Writes a batch of records into the configured collection
pub struct Loader {
    /// Store to connect to
    store: Arc<dyn DocumentStore>,

    /// Target database and collection
    config: StoreConfig,
}

impl Loader {
    /// Create a loader for a store and target namespace
    pub fn new(store: Arc<dyn DocumentStore>, config: StoreConfig) -> Self {
        Self { store, config }
    }

    /// Target collection name
    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// Insert every record with a single bulk insert
    ///
    /// An empty batch returns `Ok(0)` without opening a connection. Otherwise
    /// one connection is opened, used for one `insert_many`, and closed
    /// whether or not the insert succeeded.
    ///
    /// # Returns
    /// The number of documents the store acknowledged
    ///
    /// # Errors
    /// Returns the connection or write error; nothing is retried.
    pub async fn load(&self, records: Vec<SampleRecord>) -> Result<u64> {
        if records.is_empty() {
            info!("No records to insert");
            return Ok(0);
        }

        let mut conn = self.store.connect().await?;
        debug!(
            "Connected to store, inserting {} records into {}.{}",
            records.len(),
            self.config.database,
            self.config.collection
        );

        let result = conn
            .insert_many(&self.config.database, &self.config.collection, &records)
            .await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close store connection: {}", e);
        }

        let inserted = result?;
        info!(
            "Inserted {} records into collection '{}'",
            inserted, self.config.collection
        );
        Ok(inserted)
    }
}
