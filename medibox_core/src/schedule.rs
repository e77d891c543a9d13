//! Projection of stored times-of-day onto the current calendar day.
//!
//! A schedule stores a time-of-day value whose date part (if any) carries no
//! meaning. Normalization keeps hour and minute, drops seconds, and places the
//! result on the calendar day of the supplied `now`.

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeZone, Timelike};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Extract hour and minute from a stored time-of-day.
///
/// Accepts `HH:MM`, `HH:MM:SS`, naive date-times, and RFC 3339 timestamps.
/// RFC 3339 values are first converted into `offset` so the wall-clock hour
/// matches the device's local view. Returns `None` for anything else.
pub fn parse_hour_minute(stored: &str, offset: &FixedOffset) -> Option<(u32, u32)> {
    let stored = stored.trim();
    if stored.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(stored) {
        let local = dt.with_timezone(offset);
        return Some((local.hour(), local.minute()));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(stored, fmt) {
            return Some((dt.hour(), dt.minute()));
        }
    }

    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(stored, fmt) {
            return Some((t.hour(), t.minute()));
        }
    }

    None
}

/// Place a stored time-of-day on `now`'s calendar day.
///
/// The result shares `now`'s offset and has zero seconds. `None` means the
/// stored value is malformed and the schedule must be left out of the timeline.
pub fn normalize(stored: &str, now: &DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let (hour, minute) = parse_hour_minute(stored, now.offset())?;
    let naive = now.date_naive().and_hms_opt(hour, minute, 0)?;
    now.offset().from_local_datetime(&naive).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now_at(offset_hours: i32) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!(
            "2026-10-15T10:42:17{:+03}:00",
            offset_hours
        ))
        .unwrap()
    }

    #[test]
    fn test_hh_mm_lands_on_today() {
        let now = now_at(0);
        let dose = normalize("08:30", &now).unwrap();
        assert_eq!(dose.to_rfc3339(), "2026-10-15T08:30:00+00:00");
    }

    #[test]
    fn test_seconds_are_dropped() {
        let now = now_at(0);
        let dose = normalize("21:15:59", &now).unwrap();
        assert_eq!(dose.second(), 0);
        assert_eq!((dose.hour(), dose.minute()), (21, 15));
    }

    #[test]
    fn test_stored_date_is_ignored() {
        let now = now_at(0);
        let a = normalize("1999-01-02T07:05:00", &now).unwrap();
        let b = normalize("2031-12-31 07:05", &now).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.date_naive(), now.date_naive());
    }

    #[test]
    fn test_rfc3339_is_read_in_local_offset() {
        let now = now_at(2);
        let dose = normalize("2001-03-04T21:15:00+00:00", &now).unwrap();
        assert_eq!(dose.to_rfc3339(), "2026-10-15T23:15:00+02:00");
    }

    #[test]
    fn test_malformed_values_produce_nothing() {
        let now = now_at(0);
        for bad in ["", "   ", "noon", "25:00", "12:61", "2026-13-01T08:00"] {
            assert!(normalize(bad, &now).is_none(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_offset_is_preserved() {
        let now = now_at(-5);
        let dose = normalize("06:00", &now).unwrap();
        assert_eq!(dose.offset(), now.offset());
    }
}
