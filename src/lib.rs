// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod render;

pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::ingest::{AggregationRun, Aggregator, Entry};

use std::sync::Arc;

use crate::ingest::fetcher::HttpFetcher;
use crate::ingest::parser::RssParser;
use crate::render::RssRenderer;

/// Wire the HTTP fetcher, RSS parser, and RSS renderer from configuration.
pub fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let fetcher = HttpFetcher::new(&cfg.user_agent, cfg.client_timeout())?;
    let mut aggregator = Aggregator::new(
        cfg.sources.clone(),
        Arc::new(fetcher),
        Arc::new(RssParser::new()),
    );
    if let Some(limit) = cfg.source_timeout() {
        aggregator = aggregator.with_source_timeout(limit);
    }
    let renderer = Arc::new(RssRenderer::new(cfg.channel.clone()));
    Ok(AppState::new(aggregator, renderer))
}
