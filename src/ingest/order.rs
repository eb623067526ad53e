// src/ingest/order.rs
use crate::ingest::types::Entry;

/// Newest first. The sort is stable, so entries with equal timestamps keep
/// their arrival order.
pub fn order_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// True when no entry is newer than the one before it.
pub fn is_newest_first(entries: &[Entry]) -> bool {
    entries
        .windows(2)
        .all(|w| w[0].published_at >= w[1].published_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(day: u32, title: &str) -> Entry {
        Entry {
            title: title.into(),
            link: format!("https://x.test/{title}"),
            description: String::new(),
            guid: String::new(),
            published_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn sorts_descending() {
        let mut v = vec![at(1, "a"), at(3, "b"), at(2, "c")];
        order_newest_first(&mut v);
        let titles: Vec<_> = v.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["b", "c", "a"]);
        assert!(is_newest_first(&v));
    }

    #[test]
    fn ties_keep_arrival_order() {
        let mut v = vec![at(2, "first"), at(5, "top"), at(2, "second"), at(2, "third")];
        order_newest_first(&mut v);
        let titles: Vec<_> = v.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["top", "first", "second", "third"]);
    }

    #[test]
    fn empty_and_single_are_trivially_ordered() {
        let mut none: Vec<Entry> = vec![];
        order_newest_first(&mut none);
        assert!(is_newest_first(&none));
        assert!(is_newest_first(&[at(1, "x")]));
    }
}
