//! Timestamp utilities
//!
//! All instants are stored as RFC 3339 text with whole-second precision so
//! that lexicographic comparison in SQL matches chronological order.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage
pub fn to_db(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp
pub fn from_db(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidInput(format!("Invalid timestamp '{}': {}", s, e)))
}

/// Query window for a flight board day
///
/// With a date: `[date 00:00:00, date 23:59:59]`, bounds interpreted as
/// UTC. Without a date: now through +24 hours.
pub fn day_window(date: Option<NaiveDate>) -> (DateTime<Utc>, DateTime<Utc>) {
    match date {
        Some(d) => {
            let start = d.and_hms_opt(0, 0, 0).expect("valid midnight");
            let end = d.and_hms_opt(23, 59, 59).expect("valid end of day");
            (start.and_utc(), end.and_utc())
        }
        None => {
            let start = now();
            (start, start + Duration::hours(24))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn db_format_round_trips() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 24, 9, 30, 0).unwrap();
        let stored = to_db(ts);
        assert_eq!(stored, "2026-08-24T09:30:00Z");
        assert_eq!(from_db(&stored).unwrap(), ts);
    }

    #[test]
    fn from_db_rejects_garbage() {
        assert!(from_db("not-a-timestamp").is_err());
    }

    #[test]
    fn day_window_with_date_covers_whole_day() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        let (start, end) = day_window(Some(date));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 24, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 8, 24, 23, 59, 59).unwrap());
    }

    #[test]
    fn day_window_without_date_is_next_24h() {
        let (start, end) = day_window(None);
        assert_eq!(end - start, Duration::hours(24));
        // Start is "now", within test slack
        assert!((now() - start).num_seconds() < 5);
    }

    #[test]
    fn db_format_sorts_chronologically() {
        let early = to_db(Utc.with_ymd_and_hms(2026, 8, 24, 9, 0, 0).unwrap());
        let late = to_db(Utc.with_ymd_and_hms(2026, 8, 24, 10, 0, 0).unwrap());
        assert!(early < late);
    }
}
