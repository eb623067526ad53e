// src/ingest/aggregator.rs
//! Fan-in over all configured sources for one request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::ingest::ensure_metrics_described;
use crate::ingest::fetcher::run_source;
use crate::ingest::order::order_newest_first;
use crate::ingest::types::{Entry, FeedFetcher, FeedParser, FetchEvent, SourceOutcome};

/// Result of one fetch-merge-sort cycle. Owned by the caller, never shared.
#[derive(Debug, Default)]
pub struct AggregationRun {
    /// Newest first.
    pub entries: Vec<Entry>,
    /// One per configured source, in completion order.
    pub outcomes: Vec<(String, SourceOutcome)>,
}

impl AggregationRun {
    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| !o.is_ok()).count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                SourceOutcome::Ok { rejected, .. } => *rejected,
                _ => 0,
            })
            .sum()
    }
}

/// Drives one fetch task per source and collects their entries.
#[derive(Clone)]
pub struct Aggregator {
    sources: Arc<[String]>,
    fetcher: Arc<dyn FeedFetcher>,
    parser: Arc<dyn FeedParser>,
    source_timeout: Option<Duration>,
}

impl Aggregator {
    pub fn new(
        sources: Vec<String>,
        fetcher: Arc<dyn FeedFetcher>,
        parser: Arc<dyn FeedParser>,
    ) -> Self {
        Self {
            sources: sources.into(),
            fetcher,
            parser,
            source_timeout: None,
        }
    }

    /// Give every source a deadline; expiry counts as a failed source.
    pub fn with_source_timeout(mut self, limit: Duration) -> Self {
        self.source_timeout = Some(limit);
        self
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Fetch every source concurrently and return their entries newest first.
    ///
    /// Returns only after every source has completed, successfully or not.
    /// Dropping the returned future aborts the outstanding fetch tasks.
    pub async fn run(&self) -> AggregationRun {
        ensure_metrics_described();
        let t0 = Instant::now();

        let (tx, mut rx) = mpsc::unbounded_channel::<FetchEvent>();
        let mut tasks = JoinSet::new();
        for source in self.sources.iter() {
            tasks.spawn(run_source(
                source.clone(),
                Arc::clone(&self.fetcher),
                Arc::clone(&self.parser),
                self.source_timeout,
                tx.clone(),
            ));
        }
        drop(tx);

        let mut outstanding = self.sources.len();
        let mut run = AggregationRun {
            entries: Vec::new(),
            outcomes: Vec::with_capacity(outstanding),
        };

        while outstanding > 0 {
            match rx.recv().await {
                Some(FetchEvent::Entry { entry, .. }) => run.entries.push(entry),
                Some(FetchEvent::Completed { source, outcome }) => {
                    outstanding -= 1;
                    tracing::debug!(target: "ingest", source = %source, outstanding, "source completed");
                    run.outcomes.push((source, outcome));
                }
                None => {
                    // every sender gone without a completion: only possible if
                    // a task was torn down outside of its guard
                    tracing::error!(target: "ingest", outstanding, "fan-in closed early");
                    break;
                }
            }
        }
        drop(tasks);

        order_newest_first(&mut run.entries);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        counter!("smash_runs_total").increment(1);
        histogram!("smash_run_ms").record(ms);
        tracing::info!(
            target: "ingest",
            sources = self.sources.len(),
            failed = run.failed(),
            entries = run.entries.len(),
            rejected = run.rejected(),
            ms,
            "aggregation run finished"
        );

        run
    }
}
