//! rss-smash: binary entrypoint.
//! Loads configuration, installs logging and metrics, and serves the merged feed.

use anyhow::Context;
use rss_smash::{build_state, config::AppConfig, metrics::Metrics, router};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` picks the filter (default `rss_smash=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rss_smash=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load().context("loading configuration")?;
    if cfg.sources.is_empty() {
        tracing::warn!("no sources configured; /rss.xml will serve an empty channel");
    }

    let metrics = Metrics::init().context("installing prometheus recorder")?;
    let state = build_state(&cfg)?;
    let app = router(state).merge(metrics.router());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, sources = cfg.sources.len(), "listening");

    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
