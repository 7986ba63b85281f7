//! Feed line parsing
//!
//! The MalShare list feed is one sample per line, tab separated:
//!
//! ```text
//! SHA256<TAB>FIRST_SEEN<TAB>FILETYPE<TAB>ORIGIN
//! SHA256<TAB>FIRST_SEEN<TAB>FILETYPE
//! ```
//!
//! Blank lines and lines starting with `#` are skipped silently. Anything else
//! that does not fit one of the two shapes is reported as malformed and
//! dropped without affecting the rest of the batch.

use crate::types::{MalformedLine, SampleRecord};
use chrono::Utc;
use tracing::{debug, warn};

/// Field separator used by the feed
pub const FIELD_SEPARATOR: char = '\t';

/// Prefix marking a comment line
pub const COMMENT_PREFIX: char = '#';

/// Classification of a single feed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty or whitespace-only
    Blank,
    /// Starts with `#`
    Comment,
    /// Three or four usable fields
    Sample(SampleFields<'a>),
    /// Wrong field count or an empty required field
    Malformed,
}

/// Borrowed field values of an accepted feed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFields<'a> {
    /// Sample hash
    pub sha256: &'a str,
    /// First-seen timestamp, verbatim
    pub first_seen: &'a str,
    /// File type label
    pub filetype: &'a str,
    /// Origin label, empty for three-field lines
    pub origin: &'a str,
}

impl SampleFields<'_> {
    /// Build an owned record, stamping `ingested_at` with the current UTC time
    pub fn into_record(self) -> SampleRecord {
        SampleRecord {
            sha256: self.sha256.to_string(),
            first_seen: self.first_seen.to_string(),
            filetype: self.filetype.to_string(),
            origin: self.origin.to_string(),
            ingested_at: Utc::now(),
        }
    }
}

/// Result of parsing a whole feed
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// Records in feed order
    pub records: Vec<SampleRecord>,
    /// Lines rejected as malformed, in feed order
    pub malformed: Vec<MalformedLine>,
    /// Blank and comment lines
    pub skipped: usize,
}

/// Classify one feed line
pub fn classify_line(line: &str) -> LineKind<'_> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if line.starts_with(COMMENT_PREFIX) {
        return LineKind::Comment;
    }

    let mut fields = line.split(FIELD_SEPARATOR);
    let (Some(sha256), Some(first_seen), Some(filetype)) =
        (fields.next(), fields.next(), fields.next())
    else {
        return LineKind::Malformed;
    };
    // Anything past the fourth field is ignored
    let origin = fields.next().unwrap_or("");

    if [sha256, first_seen, filetype]
        .iter()
        .any(|field| field.is_empty())
    {
        return LineKind::Malformed;
    }

    LineKind::Sample(SampleFields {
        sha256,
        first_seen,
        filetype,
        origin,
    })
}

/// Parse a raw feed into records, collecting malformed lines
///
/// Never fails: an empty feed, or one where every line is skipped, yields an
/// empty report.
pub fn parse_feed(raw: &str) -> ParseReport {
    let mut report = ParseReport::default();

    for (index, line) in raw.lines().enumerate() {
        match classify_line(line) {
            LineKind::Blank | LineKind::Comment => report.skipped += 1,
            LineKind::Sample(fields) => report.records.push(fields.into_record()),
            LineKind::Malformed => {
                let line_number = index + 1;
                warn!(line_number, "Skipping malformed line: {}", line);
                report.malformed.push(MalformedLine {
                    line_number,
                    content: line.to_string(),
                });
            }
        }
    }

    debug!(
        records = report.records.len(),
        malformed = report.malformed.len(),
        skipped = report.skipped,
        "Parsed feed"
    );

    report
}

/// Parse a raw feed into records, dropping malformed lines
pub fn transform(raw: &str) -> Vec<SampleRecord> {
    parse_feed(raw).records
}
