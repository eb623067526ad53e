// src/ingest/mod.rs
pub mod aggregator;
pub mod fetcher;
pub mod normalize;
pub mod order;
pub mod parser;
pub mod types;

pub use aggregator::{AggregationRun, Aggregator};
pub use types::{Entry, FeedFetcher, FeedParser, FetchEvent, RawEntry, SourceOutcome};

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("smash_runs_total", "Aggregation runs completed.");
        describe_counter!(
            "smash_entries_total",
            "Entries normalized and handed to the fan-in."
        );
        describe_counter!(
            "smash_entries_rejected_total",
            "Entries dropped by normalization (missing link / bad date)."
        );
        describe_counter!(
            "smash_source_failures_total",
            "Sources that failed to fetch, decode, or finish in time."
        );
        describe_histogram!("smash_parse_ms", "Feed decode time in milliseconds.");
        describe_histogram!("smash_run_ms", "Whole aggregation run in milliseconds.");
    });
}
