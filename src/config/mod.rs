// src/config/mod.rs
//! Process configuration: the source list, channel metadata, and listener
//! settings. Built once in `main` and handed to the pipeline by value.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "SMASH_CONFIG_PATH";
pub const ENV_PORT: &str = "PORT";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;
/// How far the HTTP client timeout trails the per-source deadline.
pub const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(5);
pub const DEFAULT_CONFIG_TOML: &str = "config/smash.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/smash.json";

const DEFAULT_SOURCES: &[&str] = &[
    "http://comicsrss.herokuapp.com/cad",
    "http://comicsrss.herokuapp.com/thedoghousediaries",
    "http://comicsrss.herokuapp.com/cyanide",
    "http://www.questionablecontent.net/QCRSS.xml",
    "http://twitterthecomic.tumblr.com/rss",
    "http://www.xkcd.com/rss.xml",
    "http://www.rsspect.com/rss/gunshowcomic.xml",
];

/// `<channel>` metadata of the served feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "RSS! SMASH!".to_string(),
            link: "http://rss-smash.herokuapp.com/rss.xml".to_string(),
            description: "An RSS mashup of all my comics".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    /// Per-source deadline; 0 disables it and a hung source stalls the run.
    pub source_timeout_secs: u64,
    pub user_agent: String,
    pub channel: ChannelConfig,
    /// Fetched in order given; duplicates are fetched independently.
    pub sources: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            user_agent: concat!("rss-smash/", env!("CARGO_PKG_VERSION")).to_string(),
            channel: ChannelConfig::default(),
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AppConfig {
    pub fn source_timeout(&self) -> Option<Duration> {
        (self.source_timeout_secs > 0).then(|| Duration::from_secs(self.source_timeout_secs))
    }

    /// Request timeout for the HTTP client. Kept past the per-source deadline
    /// so a slow source always ends as a deadline expiry, not a client error.
    pub fn client_timeout(&self) -> Option<Duration> {
        self.source_timeout().map(|d| d + CLIENT_TIMEOUT_GRACE)
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load using env var + fallbacks, then apply `$PORT`:
    /// 1) $SMASH_CONFIG_PATH
    /// 2) config/smash.toml
    /// 3) config/smash.json
    /// 4) built-in defaults
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file_default()?;
        cfg.apply_port_override(std::env::var(ENV_PORT).ok())?;
        Ok(cfg)
    }

    fn load_file_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
        }
        for candidate in [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Ok(Self::default())
    }

    /// `PORT` wins over the file. Blank is treated as unset.
    pub fn apply_port_override(&mut self, raw: Option<String>) -> Result<()> {
        let Some(raw) = raw else { return Ok(()) };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        self.port = raw
            .parse::<u16>()
            .with_context(|| format!("{ENV_PORT}={raw:?} is not a port number"))?;
        Ok(())
    }

    fn cleaned(mut self) -> Self {
        self.sources = self
            .sources
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    let parsed = match hint_ext {
        "toml" => toml::from_str::<AppConfig>(s).context("toml")?,
        "json" => serde_json::from_str::<AppConfig>(s).context("json")?,
        // No usable extension: JSON documents start with `{`.
        _ if s.trim_start().starts_with('{') => serde_json::from_str(s).context("json")?,
        _ => toml::from_str(s).context("toml")?,
    };
    Ok(parsed.cleaned())
}
