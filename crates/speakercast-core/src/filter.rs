//! Filtering of non-substantive catalog entries.
//!
//! Every conference listing includes procedural items (openings, the
//! sustaining of officers, audit and statistical reports) that are not
//! talks anyone wants in a feed.

use crate::models::RawTalkRecord;

/// Titles dropped on exact match.
const DENIED_TITLES: &[&str] = &["Welcome to Conference", "The Sustaining of Church Officers"];

/// Titles dropped when they contain any of these markers.
const REPORT_MARKERS: &[&str] = &["Church Auditing Department Report", "Statistical Report"];

/// Whether a record is worth keeping. Looks at the unmodified title only.
pub fn is_substantive(record: &RawTalkRecord) -> bool {
    is_substantive_title(&record.title)
}

pub fn is_substantive_title(title: &str) -> bool {
    !DENIED_TITLES.contains(&title) && !REPORT_MARKERS.iter().any(|m| title.contains(m))
}
