//! # malshare-etl
//!
//! Pulls the MalShare sample list, parses each line into a [`SampleRecord`]
//! and bulk-inserts the records into a document store.
//!
//! The pipeline runs three stages in sequence:
//! - **Extract** - one HTTP GET against the MalShare API ([`extract`])
//! - **Transform** - tab-separated lines into records, malformed lines
//!   reported and dropped ([`transform`])
//! - **Load** - a single bulk insert into the configured collection ([`load`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use malshare_etl::{Config, Pipeline};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::new(config)?;
//!
//!     let mut events = pipeline.subscribe();
//!     let outcome = pipeline.run().await;
//!     while let Ok(event) = events.try_recv() {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Feed extraction
pub mod extract;
/// Bulk loading
pub mod load;
/// Stage orchestration
pub mod pipeline;
/// Document store backends
pub mod store;
/// Feed parsing
pub mod transform;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, FeedConfig, StoreConfig};
pub use error::{Error, FetchFailure, Result, StoreError};
pub use extract::{FeedSource, HttpFeedSource};
pub use load::Loader;
pub use pipeline::Pipeline;
pub use store::{
    DocumentStore, MongoDocumentStore, SqliteDocumentStore, StoreBackend, StoreConnection,
    open_store,
};
pub use transform::{ParseReport, parse_feed, transform};
pub use types::{Event, MalformedLine, RunOutcome, SampleRecord};
