//! Wall-clock helpers.
//!
//! Timestamps travel as Unix milliseconds (UTC); formatting for display uses
//! the local offset.

use chrono::{Local, LocalResult, TimeZone, Utc};

/// Get the current Unix timestamp in milliseconds.
pub fn now_unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a Unix timestamp (milliseconds) to RFC 3339 in the local offset.
///
/// Timestamps arrive inside client payloads and are not validated anywhere,
/// so out-of-range values fall back to the raw number instead of panicking.
pub fn millis_to_rfc3339(timestamp_millis: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_millis) {
        LocalResult::Single(dt) => dt.to_rfc3339(),
        _ => timestamp_millis.to_string(),
    }
}
