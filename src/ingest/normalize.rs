// src/ingest/normalize.rs
//! Entry normalization: raw parser output → canonical [`Entry`].
//!
//! Two publication-date layouts are accepted, tried in order:
//! 1. RFC 1123 with a numeric zone (`Mon, 02 Jan 2006 15:04:05 -0700`)
//! 2. RFC 1123 with a zone abbreviation (`Mon, 02 Jan 2006 15:04:05 MST`),
//!    read as a naive wall-clock time in UTC.
//!
//! The weekday must be a day name but is not checked against the date; feeds
//! get it wrong often enough. Anything else is rejected.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::ingest::types::{Entry, RawEntry};

// Both layouts after the `Www, ` prefix has been taken off.
const RFC1123Z_TAIL: &str = "%d %b %Y %H:%M:%S %z";
const RFC1123_NAIVE_TAIL: &str = "%d %b %Y %H:%M:%S";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Why an entry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingLink,
    BadDate,
}

impl Rejection {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingLink => "missing_link",
            Rejection::BadDate => "bad_date",
        }
    }
}

/// Parse a publication date in one of the two accepted layouts.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = strip_weekday(s.trim())?;
    if let Ok(dt) = DateTime::parse_from_str(s, RFC1123Z_TAIL) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_zone_abbrev(s)
}

fn strip_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(',')?;
    WEEKDAYS
        .iter()
        .any(|d| d.eq_ignore_ascii_case(day))
        .then_some(rest.trim_start())
}

fn parse_zone_abbrev(s: &str) -> Option<DateTime<Utc>> {
    let (rest, zone) = s.rsplit_once(char::is_whitespace)?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    NaiveDateTime::parse_from_str(rest.trim_end(), RFC1123_NAIVE_TAIL)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Turn a raw entry into an [`Entry`], or say why it can't be one.
pub fn normalize(raw: RawEntry) -> Result<Entry, Rejection> {
    let link = raw
        .links
        .into_iter()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or(Rejection::MissingLink)?;

    let published_at = raw
        .pub_date
        .as_deref()
        .and_then(parse_pub_date)
        .ok_or(Rejection::BadDate)?;

    Ok(Entry {
        title: raw.title,
        link,
        description: raw.description,
        guid: raw.guid.unwrap_or_default(),
        published_at,
    })
}
