// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

mod support;

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use rss_smash::api::{self, AppState, HEADER_FAILED, HEADER_SOURCES};
use rss_smash::config::ChannelConfig;
use rss_smash::render::{FeedRenderer, RenderedFeed, RssRenderer};
use rss_smash::Entry;
use support::{aggregator, Doc, MapFetcher, SOURCE_A, SOURCE_C};

const BODY_LIMIT: usize = 1024 * 1024;

struct BrokenRenderer;

impl FeedRenderer for BrokenRenderer {
    fn render(&self, _entries: &[Entry]) -> anyhow::Result<RenderedFeed> {
        Err(anyhow!("template exploded"))
    }
}

fn app_with(fetcher: MapFetcher, sources: &[&str], renderer: Arc<dyn FeedRenderer>) -> Router {
    let agg = aggregator(sources, Arc::new(fetcher));
    api::router(AppState::new(agg, renderer))
}

fn rss_renderer() -> Arc<dyn FeedRenderer> {
    Arc::new(RssRenderer::new(ChannelConfig::default()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, headers, String::from_utf8(bytes).expect("utf8"))
}

#[tokio::test]
async fn health_returns_ok() {
    let app = app_with(MapFetcher::new(), &[], rss_renderer());
    let (status, _, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn rss_merges_sources_and_hides_failures() {
    let fetcher = MapFetcher::new()
        .with("a", Doc::Body(SOURCE_A.into()))
        .with("b", Doc::Fail("connection reset by peer"))
        .with("c", Doc::Body(SOURCE_C.into()));
    let app = app_with(fetcher, &["a", "b", "c"], rss_renderer());

    let (status, headers, body) = get(app, "/rss.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/rss+xml");
    assert_eq!(headers[HEADER_SOURCES], "3");
    assert_eq!(headers[HEADER_FAILED], "1");

    assert_eq!(body.matches("<item>").count(), 3);
    let newest = body.find("https://a.test/strips/3").unwrap();
    let middle = body.find("https://c.test/strips/2").unwrap();
    let oldest = body.find("https://a.test/strips/1").unwrap();
    assert!(newest < middle && middle < oldest, "body: {body}");
    assert!(!body.contains("connection reset"), "failure leaked: {body}");
    assert!(!body.contains("A no link"));
}

#[tokio::test]
async fn all_sources_failing_is_still_200_with_empty_channel() {
    let fetcher = MapFetcher::new().with("x", Doc::Fail("dns"));
    let app = app_with(fetcher, &["x", "y"], rss_renderer());

    let (status, headers, body) = get(app, "/rss.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[HEADER_FAILED], "2");
    assert!(body.contains("<channel>"));
    assert!(!body.contains("<item>"));
}

#[tokio::test]
async fn each_request_is_a_fresh_run() {
    let fetcher = Arc::new(MapFetcher::new().with("c", Doc::Body(SOURCE_C.into())));
    let agg = aggregator(&["c"], fetcher.clone());
    let app = api::router(AppState::new(agg, rss_renderer()));

    let (_, _, first) = get(app.clone(), "/rss.xml").await;
    let (_, _, second) = get(app, "/rss.xml").await;
    assert_eq!(fetcher.calls(), 2, "no caching between requests");
    assert_eq!(first, second);
}

#[tokio::test]
async fn render_failure_is_the_only_500() {
    let fetcher = MapFetcher::new().with("c", Doc::Body(SOURCE_C.into()));
    let app = app_with(fetcher, &["c"], Arc::new(BrokenRenderer));

    let (status, _, body) = get(app, "/rss.xml").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("template exploded"));
}
