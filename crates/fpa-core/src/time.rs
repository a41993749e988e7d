//! Lightweight UTC date/time utilities (no chrono dependency).
//!
//! Uses Howard Hinnant's civil_from_days / days_from_civil algorithms for
//! Unix-to-date conversion. Readings carry fractional Unix seconds; these
//! helpers exist for the ingest side (ISO-8601 columns in recordings) and
//! for human-readable report output.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current UTC time as Unix seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Current UTC timestamp in ISO-8601 format.
pub fn now_iso8601() -> String {
    unix_to_iso8601(now_unix_secs())
}

/// Convert Unix seconds to ISO-8601 UTC string.
pub fn unix_to_iso8601(secs: u64) -> String {
    let days = (secs / 86400) as i64;
    let time_of_day = secs % 86400;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let (y, m, d) = civil_from_days(days);
    format!("{y:04}-{m:02}-{d:02}T{hours:02}:{minutes:02}:{seconds:02}Z")
}

/// Parse an ISO-8601 UTC timestamp (`YYYY-MM-DDTHH:MM:SS[.frac][Z]`) into
/// fractional Unix seconds. A space separator is accepted in place of `T`.
/// Returns `None` on any malformed component or out-of-range field.
pub fn iso8601_to_unix(s: &str) -> Option<f64> {
    let s = s.trim().strip_suffix('Z').unwrap_or_else(|| s.trim());
    let (date, time) = s.split_once(['T', ' '])?;

    let mut date_parts = date.split('-');
    let year: i64 = date_parts.next()?.parse().ok()?;
    let month: u64 = date_parts.next()?.parse().ok()?;
    let day: u64 = date_parts.next()?.parse().ok()?;
    if date_parts.next().is_some() || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let mut time_parts = time.split(':');
    let hours: u64 = time_parts.next()?.parse().ok()?;
    let minutes: u64 = time_parts.next()?.parse().ok()?;
    let seconds: f64 = time_parts.next()?.parse().ok()?;
    if time_parts.next().is_some() || hours > 23 || minutes > 59 || !(0.0..60.0).contains(&seconds)
    {
        return None;
    }

    let days = days_from_civil(year, month, day);
    Some(days as f64 * 86400.0 + hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Howard Hinnant's civil_from_days: Unix epoch days → (year, month, day).
fn civil_from_days(days: i64) -> (i64, u64, u64) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

/// Inverse of [`civil_from_days`]: (year, month, day) → Unix epoch days.
fn days_from_civil(y: i64, m: u64, d: u64) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe as i64 - 719468
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_epoch() {
        assert_eq!(unix_to_iso8601(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_known_date() {
        // 2026-02-21T00:00:00Z = 1771632000
        assert_eq!(unix_to_iso8601(1771632000), "2026-02-21T00:00:00Z");
    }

    #[test]
    fn test_now_is_recent() {
        let ts = now_iso8601();
        assert!(ts.starts_with("202"), "timestamp should be in 2020s: {ts}");
    }

    #[test]
    fn test_parse_epoch() {
        assert_eq!(iso8601_to_unix("1970-01-01T00:00:00Z"), Some(0.0));
    }

    #[test]
    fn test_parse_roundtrips_format() {
        for secs in [0u64, 86399, 951868800, 1771632000, 4102444799] {
            let iso = unix_to_iso8601(secs);
            assert_eq!(iso8601_to_unix(&iso), Some(secs as f64), "via {iso}");
        }
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let t = iso8601_to_unix("2026-02-21T00:00:01.250Z").unwrap();
        assert_eq!(t, 1771632001.25);
    }

    #[test]
    fn test_parse_space_separator_no_zone() {
        assert_eq!(iso8601_to_unix("2026-02-21 00:00:00"), Some(1771632000.0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "2026-02-21",
            "00:00:00",
            "2026-13-01T00:00:00Z",
            "2026-02-21T24:00:00Z",
            "2026-02-21T00:60:00Z",
            "2026-02-21T00:00:61Z",
            "not a date at all",
            "2026-02-21T00:00Z",
        ] {
            assert_eq!(iso8601_to_unix(bad), None, "accepted {bad:?}");
        }
    }
}
