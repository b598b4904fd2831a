//! Date/time normalization shared by all adapters.
//!
//! Upstreams mix all-day dates, `Z`-suffixed UTC and offset date-times. Everything
//! is normalized to [`Instant`] (a `DateTime<FixedOffset>`); date-only values become
//! 00:00 UTC.

use crate::domain::{DomainError, Instant};
use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat,
    TimeZone, Utc,
};

/// Optional closed interval `[after, before]`. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub after: Option<Instant>,
    pub before: Option<Instant>,
}

impl TimeWindow {
    pub fn new(after: Option<Instant>, before: Option<Instant>) -> Self {
        Self { after, before }
    }

    pub fn contains(&self, at: &Instant) -> bool {
        if let Some(after) = &self.after {
            if at < after {
                return false;
            }
        }
        if let Some(before) = &self.before {
            if at > before {
                return false;
            }
        }
        true
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Midnight UTC of the given calendar date.
pub fn date_to_instant(date: NaiveDate) -> Instant {
    utc().from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Attach UTC to a wall-clock value that carries no zone.
pub fn naive_utc_to_instant(naive: NaiveDateTime) -> Instant {
    utc().from_utc_datetime(&naive)
}

/// `[00:00Z, next day 00:00Z)` for a calendar date.
pub fn utc_day_bounds(date: NaiveDate) -> (Instant, Instant) {
    let start = date_to_instant(date);
    (start, start + Duration::days(1))
}

/// Parse an RFC 3339 date-time. `Z` is accepted as the UTC designator.
pub fn parse_instant(raw: &str) -> Result<Instant, DomainError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|e| DomainError::Validation(format!("invalid date-time {raw:?}: {e}")))
}

/// Parse either a calendar date (`YYYY-MM-DD`, mapped to 00:00 UTC) or an RFC 3339 date-time.
pub fn parse_date_or_instant(raw: &str) -> Result<Instant, DomainError> {
    let raw = raw.trim();
    if raw.contains('T') {
        return parse_instant(raw);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(date_to_instant)
        .map_err(|e| DomainError::Validation(format!("invalid date {raw:?}: {e}")))
}

/// Lenient parser for caller-supplied query values.
///
/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC) or a bare date.
pub fn parse_query_instant(raw: &str) -> Result<Instant, DomainError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive_utc_to_instant(naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(date_to_instant)
        .map_err(|_| DomainError::Validation(format!("invalid date-time {raw:?}")))
}

/// Render as RFC 3339 in UTC with a `Z` suffix (calendar query bounds).
pub fn to_utc_z(at: &Instant) -> String {
    at.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Render as RFC 3339 keeping the original offset (write payloads).
pub fn to_rfc3339(at: &Instant) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instant_accepts_z() {
        let dt = parse_instant("2024-03-01T23:59:00Z").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 0);
        assert_eq!(to_utc_z(&dt), "2024-03-01T23:59:00Z");
    }

    #[test]
    fn test_parse_instant_keeps_offset() {
        let dt = parse_instant("2024-03-01T09:00:00.000+01:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 3600);
        assert_eq!(to_utc_z(&dt), "2024-03-01T08:00:00Z");
    }

    #[test]
    fn test_date_only_is_midnight_utc() {
        let dt = parse_date_or_instant("2024-03-01").unwrap();
        assert_eq!(to_rfc3339(&dt), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_query_instant_variants() {
        let naive = parse_query_instant("2024-03-01T10:30:00").unwrap();
        assert_eq!(to_utc_z(&naive), "2024-03-01T10:30:00Z");
        let date = parse_query_instant("2024-03-01").unwrap();
        assert_eq!(to_utc_z(&date), "2024-03-01T00:00:00Z");
        assert!(matches!(
            parse_query_instant("next tuesday"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_window_is_closed_interval() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (start, end) = utc_day_bounds(date);
        let window = TimeWindow::new(Some(start), Some(end));
        assert!(window.contains(&start));
        assert!(window.contains(&end));
        assert!(!window.contains(&(start - Duration::seconds(1))));
        assert!(!window.contains(&(end + Duration::seconds(1))));
        assert!(TimeWindow::default().contains(&start));
    }
}
