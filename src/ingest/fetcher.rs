// src/ingest/fetcher.rs
//! Per-source fetch task: download, decode, normalize, and push entries onto
//! the run's fan-in channel as they are produced.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use tokio::sync::mpsc::UnboundedSender;

use crate::ingest::normalize::normalize;
use crate::ingest::types::{FeedFetcher, FeedParser, FetchEvent, SourceOutcome};

/// `FeedFetcher` over HTTP. One client is shared by every source and every run.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent.to_string());
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} non-2xx"))?;
        let body = resp.bytes().await.context("reading feed body")?;
        Ok(body.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Sends the source's completion event when dropped, so it goes out exactly
/// once on every exit path, including a panic inside the task.
struct CompletionGuard {
    source: String,
    tx: UnboundedSender<FetchEvent>,
    outcome: Option<SourceOutcome>,
}

impl CompletionGuard {
    fn new(source: String, tx: UnboundedSender<FetchEvent>) -> Self {
        Self {
            source,
            tx,
            outcome: None,
        }
    }

    fn finish(mut self, outcome: SourceOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or_else(|| SourceOutcome::Failed {
            reason: "fetch task aborted".to_string(),
        });
        // Receiver may already be gone (request dropped); nothing to do then.
        let _ = self.tx.send(FetchEvent::Completed {
            source: std::mem::take(&mut self.source),
            outcome,
        });
    }
}

/// Fetch one source and stream its entries to `tx`, then signal completion.
///
/// Never fails: transport, decode, and deadline errors become a
/// `SourceOutcome` on the completion event.
pub async fn run_source(
    source: String,
    fetcher: Arc<dyn FeedFetcher>,
    parser: Arc<dyn FeedParser>,
    deadline: Option<Duration>,
    tx: UnboundedSender<FetchEvent>,
) {
    let guard = CompletionGuard::new(source.clone(), tx.clone());

    let work = pump_entries(&source, fetcher.as_ref(), parser.as_ref(), &tx);
    let result = match deadline {
        Some(limit) => tokio::time::timeout(limit, work).await.ok(),
        None => Some(work.await),
    };

    let outcome = match result {
        Some(Ok((entries, rejected))) => {
            tracing::info!(target: "ingest", source = %source, entries, rejected, "source done");
            SourceOutcome::Ok { entries, rejected }
        }
        Some(Err(e)) => {
            tracing::warn!(target: "ingest", source = %source, error = ?e, "source failed");
            counter!("smash_source_failures_total", "kind" => "error").increment(1);
            SourceOutcome::Failed {
                reason: format!("{e:#}"),
            }
        }
        None => {
            tracing::warn!(target: "ingest", source = %source, ?deadline, "source timed out");
            counter!("smash_source_failures_total", "kind" => "timeout").increment(1);
            SourceOutcome::TimedOut
        }
    };

    guard.finish(outcome);
}

/// Returns (entries sent, entries rejected).
async fn pump_entries(
    source: &str,
    fetcher: &dyn FeedFetcher,
    parser: &dyn FeedParser,
    tx: &UnboundedSender<FetchEvent>,
) -> Result<(usize, usize)> {
    let body = fetcher
        .fetch(source)
        .await
        .with_context(|| format!("fetching via {}", fetcher.name()))?;
    let raw = parser.decode(&body)?;
    tracing::debug!(target: "ingest", source, items = raw.len(), "decoded feed");

    let mut sent = 0usize;
    let mut rejected = 0usize;
    for item in raw {
        match normalize(item) {
            Ok(entry) => {
                let ev = FetchEvent::Entry {
                    source: source.to_string(),
                    entry,
                };
                if tx.send(ev).is_err() {
                    tracing::debug!(target: "ingest", source, "run gone, stopping early");
                    break;
                }
                sent += 1;
            }
            Err(why) => {
                rejected += 1;
                counter!("smash_entries_rejected_total", "reason" => why.as_str()).increment(1);
            }
        }
    }
    counter!("smash_entries_total").increment(sent as u64);
    Ok((sent, rejected))
}
