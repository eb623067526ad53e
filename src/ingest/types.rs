// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One item as reported by the feed parser, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub links: Vec<String>,
    pub description: String,
    pub guid: Option<String>,
    pub pub_date: Option<String>, // as found in the document, unparsed
}

/// Canonical aggregated item. Always has a link and a UTC publication time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub description: String, // rendered verbatim (CDATA)
    pub guid: String,        // may be empty
    pub published_at: DateTime<Utc>,
}

/// How a single source finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Ok { entries: usize, rejected: usize },
    Failed { reason: String },
    TimedOut,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, SourceOutcome::Ok { .. })
    }
}

/// Message on the per-run fan-in channel.
///
/// A source sends any number of `Entry` events followed by exactly one
/// `Completed`. Both travel on the same channel, so a consumer never sees an
/// entry for a source after that source's completion.
#[derive(Debug)]
pub enum FetchEvent {
    Entry { source: String, entry: Entry },
    Completed { source: String, outcome: SourceOutcome },
}

/// Retrieves the raw document for one source URL. Bytes are handed to the
/// parser undecoded; the document itself says which charset it is in.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
    fn name(&self) -> &'static str;
}

/// Decodes a feed document into raw entries.
pub trait FeedParser: Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<Vec<RawEntry>>;
}
