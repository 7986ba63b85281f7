//! Extract, transform and load, run once
//!
//! [`Pipeline::run`] fetches the feed, parses it and bulk-inserts the records.
//! Stages run strictly in sequence. A failing stage ends the run; the failure
//! is reported as an [`Event`] and folded into the returned [`RunOutcome`]
//! instead of being propagated.

use crate::config::Config;
use crate::error::{Error, FetchFailure, Result};
use crate::extract::{FeedSource, HttpFeedSource};
use crate::load::Loader;
use crate::store::{DocumentStore, open_store};
use crate::transform::{ParseReport, parse_feed};
use crate::types::{Event, RunOutcome, SampleRecord};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Capacity of the event channel
///
/// Subscribers that fall further behind than this see `RecvError::Lagged`.
/// A run emits at most [`MAX_MALFORMED_LINE_EVENTS`] plus a few stage events, so a
/// subscriber that drains only after [`Pipeline::run`] returns never lags.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Per-run limit on [`Event::MalformedLine`] events
///
/// Lines past the limit are still logged and counted in
/// [`Event::Transformed`].
pub const MAX_MALFORMED_LINE_EVENTS: usize = 100;

/// One-shot ETL pipeline
pub struct Pipeline {
    /// Feed to pull from
    feed: Arc<dyn FeedSource>,

    /// Writes parsed records to the store
    loader: Loader,

    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
}

impl Pipeline {
    /// Build a pipeline with the HTTP feed and the store named by `config`
    ///
    /// The store backend follows the URI scheme, see [`open_store`].
    ///
    /// # Errors
    /// Returns error if the configuration is invalid, the HTTP client cannot
    /// be built, or the store URI cannot be parsed. No network or store
    /// connection is opened here.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let feed = Arc::new(HttpFeedSource::new(config.feed.clone())?);
        let store = open_store(&config.store.uri)?;

        Ok(Self::with_components(config, feed, store))
    }

    /// Build a pipeline from explicit collaborators
    pub fn with_components(
        config: Config,
        feed: Arc<dyn FeedSource>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            feed,
            loader: Loader::new(store, config.store),
            event_tx,
        }
    }

    /// Subscribe to status events
    ///
    /// Only events emitted after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine
        self.event_tx.send(event).ok();
    }

    /// Fetch the raw feed
    ///
    /// Returns the failure reason instead of an error so the caller can stop
    /// the run.
    pub async fn extract(&self) -> std::result::Result<String, FetchFailure> {
        match self.feed.fetch().await {
            Ok(raw) => {
                self.emit_event(Event::Fetched { bytes: raw.len() });
                Ok(raw)
            }
            Err(e) => {
                error!("Extraction failed: {}", e);
                let reason = match e {
                    Error::Fetch { reason } => reason,
                    other => FetchFailure::Transport {
                        message: other.to_string(),
                    },
                };
                self.emit_event(Event::FetchFailed {
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    /// Parse the raw feed, reporting each malformed line
    pub fn transform(&self, raw: &str) -> Vec<SampleRecord> {
        let ParseReport {
            records,
            malformed,
            skipped,
        } = parse_feed(raw);

        let malformed_count = malformed.len();
        for line in malformed.into_iter().take(MAX_MALFORMED_LINE_EVENTS) {
            self.emit_event(Event::MalformedLine {
                line_number: line.line_number,
                content: line.content,
            });
        }
        if malformed_count > MAX_MALFORMED_LINE_EVENTS {
            warn!(
                "{} further malformed lines not reported as events",
                malformed_count - MAX_MALFORMED_LINE_EVENTS
            );
        }

        info!(
            "Parsed {} records ({} malformed, {} skipped)",
            records.len(),
            malformed_count,
            skipped
        );
        self.emit_event(Event::Transformed {
            records: records.len(),
            malformed: malformed_count,
            skipped,
        });

        records
    }

    /// Persist records
    ///
    /// Returns the error message on failure; the records are discarded.
    pub async fn load(&self, records: Vec<SampleRecord>) -> std::result::Result<u64, String> {
        if records.is_empty() {
            self.emit_event(Event::NothingToLoad);
        }

        match self.loader.load(records).await {
            Ok(count) => {
                if count > 0 {
                    self.emit_event(Event::Loaded {
                        count,
                        collection: self.loader.collection().to_string(),
                    });
                }
                Ok(count)
            }
            Err(e) => {
                error!("Loading to store failed: {}", e);
                let message = e.to_string();
                self.emit_event(Event::LoadFailed {
                    error: message.clone(),
                });
                Err(message)
            }
        }
    }

    /// Run the pipeline once
    ///
    /// Never fails; every terminal state is a [`RunOutcome`].
    pub async fn run(&self) -> RunOutcome {
        info!("Starting MalShare ETL pipeline");
        self.emit_event(Event::RunStarted);

        let outcome = self.run_stages().await;

        match &outcome {
            RunOutcome::Loaded { count } => info!("ETL pipeline completed, {} records loaded", count),
            RunOutcome::NoRecords => info!("ETL pipeline completed, no records to load"),
            RunOutcome::FetchFailed { .. } => info!("Extraction yielded no data, exiting"),
            RunOutcome::LoadFailed { .. } => info!("ETL pipeline finished with a load failure"),
        }
        self.emit_event(Event::RunCompleted {
            outcome: outcome.clone(),
        });

        outcome
    }

    async fn run_stages(&self) -> RunOutcome {
        let raw = match self.extract().await {
            Ok(raw) => raw,
            Err(reason) => return RunOutcome::FetchFailed { reason },
        };

        let records = self.transform(&raw);
        if records.is_empty() {
            info!("No records to insert");
            self.emit_event(Event::NothingToLoad);
            return RunOutcome::NoRecords;
        }

        match self.load(records).await {
            Ok(count) => RunOutcome::Loaded { count },
            Err(error) => RunOutcome::LoadFailed { error },
        }
    }
}
