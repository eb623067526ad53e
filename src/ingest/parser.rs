// src/ingest/parser.rs
use std::borrow::Cow;

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::{FeedParser, RawEntry};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<String>,
    description: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

// <guid isPermaLink="false">...</guid>
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text", default)]
    value: String,
}

/// RSS 2.0 decoder (`rss/channel/item`).
#[derive(Debug, Default, Clone, Copy)]
pub struct RssParser;

impl RssParser {
    pub fn new() -> Self {
        Self
    }
}

impl FeedParser for RssParser {
    fn decode(&self, body: &[u8]) -> Result<Vec<RawEntry>> {
        let t0 = std::time::Instant::now();
        let text = decode_charset(body);
        let xml_clean = scrub_html_entities_for_xml(&text);
        let rss: Rss = from_str(&xml_clean).context("decoding rss xml")?;

        let out = rss
            .channel
            .item
            .into_iter()
            .map(|it| RawEntry {
                title: it.title.unwrap_or_default().trim().to_string(),
                links: it
                    .links
                    .into_iter()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect(),
                description: it.description.unwrap_or_default(),
                guid: it
                    .guid
                    .map(|g| g.value.trim().to_string())
                    .filter(|g| !g.is_empty()),
                pub_date: it.pub_date,
            })
            .collect::<Vec<_>>();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("smash_parse_ms").record(ms);
        Ok(out)
    }
}

/// Resolve the document charset: BOM first, then the XML declaration's
/// `encoding`, then UTF-8. The BOM is dropped from the result.
fn decode_charset(body: &[u8]) -> Cow<'_, str> {
    // A declaration we could read as ASCII rules out UTF-16.
    let enc = declared_encoding(body)
        .and_then(Encoding::for_label)
        .filter(|e| *e != UTF_16LE && *e != UTF_16BE)
        .unwrap_or(UTF_8);
    let (text, used, lossy) = enc.decode(body);
    if lossy {
        tracing::debug!(target: "ingest", charset = used.name(), "feed body had undecodable bytes");
    }
    text
}

/// `encoding="…"` from a leading `<?xml … ?>` declaration, if any.
fn declared_encoding(body: &[u8]) -> Option<&[u8]> {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let decl = body.strip_prefix(b"<?xml")?;
    let end = decl.windows(2).position(|w| w == b"?>")?;
    let decl = &decl[..end];

    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = decl[at + 8..].trim_ascii_start().strip_prefix(b"=")?.trim_ascii_start();
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let close = rest.iter().position(|&b| b == quote)?;
    Some(&rest[..close])
}

/// HTML entities show up in real feeds but are not defined in XML. CDATA
/// sections are copied through untouched.
fn scrub_html_entities_for_xml(s: &str) -> String {
    const OPEN: &str = "<![CDATA[";
    const CLOSE: &str = "]]>";

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&scrub_entities(&rest[..start]));
        let section = &rest[start..];
        let end = section
            .find(CLOSE)
            .map(|i| i + CLOSE.len())
            .unwrap_or(section.len());
        out.push_str(&section[..end]);
        rest = &section[end..];
    }
    out.push_str(&scrub_entities(rest));
    out
}

fn scrub_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
