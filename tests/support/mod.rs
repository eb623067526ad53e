// tests/support/mod.rs
// In-memory feed fetcher shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rss_smash::ingest::parser::RssParser;
use rss_smash::ingest::{Aggregator, FeedFetcher};

pub const SOURCE_A: &str = include_str!("../fixtures/source_a.xml");
pub const SOURCE_C: &str = include_str!("../fixtures/source_c.xml");

#[derive(Clone)]
pub enum Doc {
    Body(String),
    Fail(&'static str),
    /// Never answers.
    Hang,
    /// Answers after a delay.
    Slow(Duration, String),
}

#[derive(Default)]
pub struct MapFetcher {
    docs: HashMap<String, Doc>,
    calls: AtomicUsize,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, doc: Doc) -> Self {
        self.docs.insert(url.to_string(), doc);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.docs.get(url).cloned() {
            Some(Doc::Body(b)) => Ok(b.into_bytes()),
            Some(Doc::Fail(why)) => Err(anyhow!(why)),
            Some(Doc::Hang) => std::future::pending().await,
            Some(Doc::Slow(d, b)) => {
                tokio::time::sleep(d).await;
                Ok(b.into_bytes())
            }
            None => Err(anyhow!("no route to {url}")),
        }
    }

    fn name(&self) -> &'static str {
        "map"
    }
}

pub fn aggregator(sources: &[&str], fetcher: Arc<MapFetcher>) -> Aggregator {
    Aggregator::new(
        sources.iter().map(|s| s.to_string()).collect(),
        fetcher,
        Arc::new(RssParser::new()),
    )
}

/// Single-item RSS document.
pub fn one_item(link: &str, pub_date: &str) -> String {
    format!(
        "<rss version=\"2.0\"><channel><title>t</title>\
         <item><title>{link}</title><link>{link}</link>\
         <pubDate>{pub_date}</pubDate></item></channel></rss>"
    )
}
