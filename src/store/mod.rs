//! Document store layer
//!
//! The loader talks to storage only through [`DocumentStore`] and
//! [`StoreConnection`]. A connection is opened per load and closed before the
//! load returns.
//!
//! ## Backends
//!
//! [`open_store`] picks the backend from the URI scheme:
//!
//! - `mongodb://`, `mongodb+srv://` - [`MongoDocumentStore`], documents
//!   inserted with the driver's `insert_many`
//! - `sqlite:` - [`SqliteDocumentStore`], one table per `database.collection`
//!   namespace holding JSON documents

use crate::config::is_valid_name;
use crate::error::{Result, StoreError};
use crate::types::SampleRecord;
use async_trait::async_trait;
use std::sync::Arc;

mod mongo;
mod sqlite;

pub use mongo::{MongoDocumentStore, MongoStoreConnection};
pub use sqlite::{SqliteDocumentStore, SqliteStoreConnection};

/// Storage backend named by a connection string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `mongodb://` or `mongodb+srv://`
    MongoDb,
    /// `sqlite:`
    Sqlite,
}

impl StoreBackend {
    /// Backend for a connection string, chosen by its scheme
    ///
    /// The scheme is matched case-insensitively. The rest of the URI is not
    /// inspected and never appears in the error.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let scheme = uri
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();

        match scheme.as_str() {
            "mongodb" | "mongodb+srv" => Ok(Self::MongoDb),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(StoreError::ConnectionFailed(format!(
                "unsupported store URI scheme {:?}",
                scheme
            ))
            .into()),
        }
    }
}

/// Build the store for a connection string
///
/// No connection is opened here.
pub fn open_store(uri: &str) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match StoreBackend::from_uri(uri)? {
        StoreBackend::MongoDb => Arc::new(MongoDocumentStore::new(uri)?),
        StoreBackend::Sqlite => Arc::new(SqliteDocumentStore::new(uri)?),
    };
    Ok(store)
}

/// A document store reachable through a connection string
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a new connection
    ///
    /// # Errors
    /// Returns [`StoreError::ConnectionFailed`] if the store cannot be reached
    async fn connect(&self) -> Result<Box<dyn StoreConnection>>;
}

/// An open connection to a document store
#[async_trait]
pub trait StoreConnection: Send {
    /// Insert all documents into `database.collection` in a single operation
    ///
    /// Returns the number of documents the store acknowledged. SQLite writes
    /// the batch in one transaction; MongoDB writes an ordered batch that
    /// stops at the first rejected document.
    async fn insert_many(
        &mut self,
        database: &str,
        collection: &str,
        documents: &[SampleRecord],
    ) -> Result<u64>;

    /// Release the connection
    ///
    /// Calling this more than once is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Quoted table identifier for a `database.collection` namespace
pub(crate) fn namespace(database: &str, collection: &str) -> Result<String> {
    if !is_valid_name(database) {
        return Err(StoreError::InvalidName {
            kind: "database",
            name: database.to_string(),
        }
        .into());
    }
    if !is_valid_name(collection) {
        return Err(StoreError::InvalidName {
            kind: "collection",
            name: collection.to_string(),
        }
        .into());
    }
    Ok(format!("\"{}.{}\"", database, collection))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
