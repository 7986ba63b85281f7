//! SQLite-backed document store.

use super::{DocumentStore, StoreConnection, namespace};
use crate::error::{Error, Result, StoreError};
use crate::types::SampleRecord;
use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use std::str::FromStr;
use tracing::debug;

/// Document store persisting JSON documents in SQLite
///
/// Each `database.collection` namespace maps to one table with an
/// auto-increment `_id` and a `document` column; tables are created on first
/// insert.
#[derive(Clone, Debug)]
pub struct SqliteDocumentStore {
    options: SqliteConnectOptions,
}

impl SqliteDocumentStore {
    /// Create a store for a connection string such as `sqlite://malshare.db`
    ///
    /// No connection is opened here. The database file is created on first
    /// connect if it does not exist.
    pub fn new(uri: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(uri)
            .map_err(|e| {
                Error::Store(StoreError::ConnectionFailed(format!(
                    "Failed to parse store URI: {}",
                    e
                )))
            })?
            .create_if_missing(true);

        Ok(Self { options })
    }

    /// Open a concrete connection
    ///
    /// Exposes the read-side queries that are not part of [`StoreConnection`].
    pub async fn open(&self) -> Result<SqliteStoreConnection> {
        let conn = self.options.connect().await.map_err(|e| {
            Error::Store(StoreError::ConnectionFailed(format!(
                "Failed to connect to store: {}",
                e
            )))
        })?;

        Ok(SqliteStoreConnection { conn: Some(conn) })
    }

    /// All documents in a collection, in insertion order
    pub async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<SampleRecord>> {
        let mut conn = self.open().await?;
        let result = conn.find_all(database, collection).await;
        conn.close().await?;
        result
    }

    /// Number of documents in a collection
    pub async fn count_documents(&self, database: &str, collection: &str) -> Result<u64> {
        let mut conn = self.open().await?;
        let result = conn.count_documents(database, collection).await;
        conn.close().await?;
        result
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>> {
        Ok(Box::new(self.open().await?))
    }
}

/// An open SQLite connection
pub struct SqliteStoreConnection {
    conn: Option<SqliteConnection>,
}

impl SqliteStoreConnection {
    pub(super) fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn.as_mut().ok_or_else(|| {
            Error::Store(StoreError::ConnectionFailed(
                "Connection already closed".to_string(),
            ))
        })
    }

    async fn collection_exists(&mut self, table: &str) -> Result<bool> {
        // `table` is quoted; sqlite_master stores the bare name
        let name = table.trim_matches('"');
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(name)
                .fetch_optional(&mut *self.conn()?)
                .await
                .map_err(|e| {
                    Error::Store(StoreError::QueryFailed(format!(
                        "Failed to look up collection: {}",
                        e
                    )))
                })?;
        Ok(found.is_some())
    }

    /// All documents in a collection, in insertion order
    ///
    /// A collection that was never written to reads as empty.
    pub async fn find_all(
        &mut self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<SampleRecord>> {
        let table = namespace(database, collection)?;
        if !self.collection_exists(&table).await? {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT document FROM {} ORDER BY _id", table);
        let rows: Vec<String> = sqlx::query_scalar(&sql)
            .fetch_all(&mut *self.conn()?)
            .await
            .map_err(|e| {
                Error::Store(StoreError::QueryFailed(format!(
                    "Failed to read documents: {}",
                    e
                )))
            })?;

        rows.iter()
            .map(|doc| serde_json::from_str(doc).map_err(Error::Serialization))
            .collect()
    }

    /// Number of documents in a collection
    pub async fn count_documents(&mut self, database: &str, collection: &str) -> Result<u64> {
        let table = namespace(database, collection)?;
        if !self.collection_exists(&table).await? {
            return Ok(0);
        }

        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut *self.conn()?)
            .await
            .map_err(|e| {
                Error::Store(StoreError::QueryFailed(format!(
                    "Failed to count documents: {}",
                    e
                )))
            })?;

        Ok(count as u64)
    }
}

#[async_trait]
impl StoreConnection for SqliteStoreConnection {
    async fn insert_many(
        &mut self,
        database: &str,
        collection: &str,
        documents: &[SampleRecord],
    ) -> Result<u64> {
        let table = namespace(database, collection)?;
        debug!("Inserting {} documents into {}", documents.len(), table);

        let mut tx = self.conn()?.begin().await.map_err(|e| {
            Error::Store(StoreError::WriteFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                document TEXT NOT NULL
            )",
            table
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            Error::Store(StoreError::WriteFailed(format!(
                "Failed to create collection {}: {}",
                table, e
            )))
        })?;

        let insert = format!("INSERT INTO {} (document) VALUES (?)", table);
        let mut inserted = 0u64;
        for record in documents {
            let document = serde_json::to_string(record)?;
            let result = sqlx::query(&insert)
                .bind(document)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Store(StoreError::WriteFailed(format!(
                        "Failed to insert document {}: {}",
                        record.sha256, e
                    )))
                })?;
            inserted += result.rows_affected();
        }

        // Dropping `tx` on any early return above rolls the batch back
        tx.commit().await.map_err(|e| {
            Error::Store(StoreError::WriteFailed(format!(
                "Failed to commit batch: {}",
                e
            )))
        })?;

        Ok(inserted)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await.map_err(|e| {
                Error::Store(StoreError::ConnectionFailed(format!(
                    "Failed to close connection: {}",
                    e
                )))
            })?;
        }
        Ok(())
    }
}
