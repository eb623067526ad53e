// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::ingest::Aggregator;
use crate::render::FeedRenderer;

/// Sources completed / failed in the run behind this response.
pub const HEADER_SOURCES: &str = "x-smash-sources";
pub const HEADER_FAILED: &str = "x-smash-failed";

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub renderer: Arc<dyn FeedRenderer>,
}

impl AppState {
    pub fn new(aggregator: Aggregator, renderer: Arc<dyn FeedRenderer>) -> Self {
        Self {
            aggregator,
            renderer,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/rss.xml", get(rss_feed))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// One aggregation run per request. Source failures only thin out the item
/// list; the only error response is a renderer failure.
async fn rss_feed(State(state): State<AppState>) -> Response {
    let run = state.aggregator.run().await;

    match state.renderer.render(&run.entries) {
        Ok(feed) => (
            [
                ("content-type", feed.content_type.to_string()),
                (HEADER_SOURCES, run.completed().to_string()),
                (HEADER_FAILED, run.failed().to_string()),
            ],
            feed.body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = ?e, entries = run.entries.len(), "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render feed").into_response()
        }
    }
}
