//! Envelope expiry and date-bucket formatting.
//!
//! Envelopes carry a claimed timestamp and expire 60 seconds of server
//! clock skew after it; the three appointment indexes are keyed by
//! `formatDate(Timestamp.UTC)`, i.e. a plain `YYYY-MM-DD` string.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// The envelope expiry window.
pub const EXPIRY_WINDOW_SECONDS: i64 = 60;

/// Check whether `claimed` is within the expiry window of `now`.
///
/// Only the past is bounded — a signed timestamp is expected to be close to
/// "now" but the service does not reject future timestamps.
pub fn is_within_expiry_window(claimed: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(claimed) <= Duration::seconds(EXPIRY_WINDOW_SECONDS)
}

/// Format a timestamp as the `YYYY-MM-DD` date bucket used as the secondary
/// index key over appointments.
pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.date_naive().format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date bucket back into a date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rejects_timestamps_older_than_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let fresh = now - Duration::seconds(59);
        let stale = now - Duration::seconds(120);
        assert!(is_within_expiry_window(fresh, now));
        assert!(!is_within_expiry_window(stale, now));
    }

    #[test]
    fn date_formatting_round_trips() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 10, 10, 0, 0).unwrap();
        let bucket = format_date(ts);
        assert_eq!(bucket, "2025-06-10");
        assert_eq!(parse_date(&bucket), Some(ts.date_naive()));
    }
}
