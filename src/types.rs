//! Core types and events

use crate::error::FetchFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sample entry from the MalShare list feed
///
/// Field values are taken verbatim from the feed. `ingested_at` is the only
/// field this crate sets itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Sample content hash
    pub sha256: String,
    /// Feed-supplied first-seen timestamp, unparsed
    pub first_seen: String,
    /// Feed-supplied file type label
    pub filetype: String,
    /// Feed-supplied source label, empty when the feed omits it
    pub origin: String,
    /// When this record was built from the feed line
    pub ingested_at: DateTime<Utc>,
}

/// A non-blank, non-comment feed line that could not be turned into a record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLine {
    /// 1-based position of the line in the raw feed
    pub line_number: usize,
    /// The offending line
    pub content: String,
}

/// Status event emitted while a pipeline run progresses
///
/// Every operator-facing status line corresponds to one of these; the same
/// information is logged through `tracing`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run started
    RunStarted,

    /// The feed was fetched
    Fetched {
        /// Size of the raw body in bytes
        bytes: usize,
    },

    /// The feed could not be fetched; the run stops
    FetchFailed {
        /// Why the fetch failed
        reason: FetchFailure,
    },

    /// A feed line was skipped as malformed
    MalformedLine {
        /// 1-based line number
        line_number: usize,
        /// The offending line
        content: String,
    },

    /// Parsing finished
    Transformed {
        /// Records produced
        records: usize,
        /// Lines rejected as malformed
        malformed: usize,
        /// Blank and comment lines skipped
        skipped: usize,
    },

    /// Nothing to persist; the store was not contacted
    NothingToLoad,

    /// Records were written to the store
    Loaded {
        /// Documents acknowledged by the store
        count: u64,
        /// Target collection
        collection: String,
    },

    /// The bulk insert failed; the batch was discarded
    LoadFailed {
        /// Error message
        error: String,
    },

    /// The run finished
    RunCompleted {
        /// Terminal state of the run
        outcome: RunOutcome,
    },
}

/// Terminal state of a pipeline run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Records were fetched, parsed and stored
    Loaded {
        /// Documents acknowledged by the store
        count: u64,
    },
    /// The feed parsed to zero records
    NoRecords,
    /// The feed could not be fetched
    FetchFailed {
        /// Why the fetch failed
        reason: FetchFailure,
    },
    /// The records could not be stored
    LoadFailed {
        /// Error message
        error: String,
    },
}

impl RunOutcome {
    /// Process exit code for this outcome
    ///
    /// `1` is left for configuration and startup errors raised before a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Loaded { .. } => 0,
            RunOutcome::NoRecords => 2,
            RunOutcome::FetchFailed { .. } => 3,
            RunOutcome::LoadFailed { .. } => 4,
        }
    }

    /// Whether the run ended in a failure rather than a legitimate terminal state
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunOutcome::FetchFailed { .. } | RunOutcome::LoadFailed { .. }
        )
    }
}
