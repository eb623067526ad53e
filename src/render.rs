// src/render.rs
//! Output document rendering. The pipeline hands over an ordered slice of
//! entries; everything about RSS syntax and escaping lives here.

use anyhow::Result;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::ChannelConfig;
use crate::ingest::Entry;

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";

// RFC 1123 with numeric zone; always written in UTC.
const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// A rendered document plus the content type to serve it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFeed {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub trait FeedRenderer: Send + Sync {
    /// Items must appear in the order given.
    fn render(&self, entries: &[Entry]) -> Result<RenderedFeed>;
}

/// RSS 2.0 renderer. Output is a pure function of the channel and entries.
#[derive(Debug, Clone)]
pub struct RssRenderer {
    channel: ChannelConfig,
}

impl RssRenderer {
    pub fn new(channel: ChannelConfig) -> Self {
        Self { channel }
    }
}

impl FeedRenderer for RssRenderer {
    fn render(&self, entries: &[Entry]) -> Result<RenderedFeed> {
        let mut w = Writer::new_with_indent(Vec::new(), b' ', 4);

        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        w.write_event(Event::Start(rss))?;
        w.write_event(Event::Start(BytesStart::new("channel")))?;

        text_element(&mut w, "title", &self.channel.title)?;
        text_element(&mut w, "link", &self.channel.link)?;
        text_element(&mut w, "description", &self.channel.description)?;

        for e in entries {
            w.write_event(Event::Start(BytesStart::new("item")))?;
            text_element(&mut w, "title", &e.title)?;
            text_element(&mut w, "link", &e.link)?;
            cdata_element(&mut w, "description", &e.description)?;
            if !e.guid.is_empty() {
                text_element(&mut w, "guid", &e.guid)?;
            }
            let pub_date = e.published_at.format(PUB_DATE_FORMAT).to_string();
            text_element(&mut w, "pubDate", &pub_date)?;
            w.write_event(Event::End(BytesEnd::new("item")))?;
        }

        w.write_event(Event::End(BytesEnd::new("channel")))?;
        w.write_event(Event::End(BytesEnd::new("rss")))?;

        let mut body = w.into_inner();
        body.push(b'\n');
        Ok(RenderedFeed {
            content_type: RSS_CONTENT_TYPE,
            body,
        })
    }
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Description HTML goes out verbatim inside CDATA. A literal `]]>` would end
/// the section early, so it is split across two sections.
fn cdata_element(w: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    let safe = value.replace("]]>", "]]]]><![CDATA[>");
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::CData(BytesCData::new(safe)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
