//! The unified arrival record shared by both feeds.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Which upstream produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Bus,
    Train,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Bus => f.write_str("bus"),
            Source::Train => f.write_str("train"),
        }
    }
}

/// One upcoming vehicle at the monitored stop or station.
///
/// Records are rebuilt from scratch on every poll tick; `eta_minutes` is
/// computed once, against the tick's single `now` sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrivalRecord {
    /// Route with any upstream decoration removed ("M15", "6").
    pub route: String,
    pub source: Source,
    /// Current bus position text, or "Uptown"/"Downtown" for trains.
    pub location_or_direction: String,
    /// `None` when the upstream gave no usable timestamp.
    pub eta_minutes: Option<i64>,
    /// Bus only. `Some(0)` when the feed carried no distance extension.
    pub stops_away: Option<u32>,
    /// Upstream instant the ETA was derived from.
    pub raw_timestamp: Option<DateTime<Utc>>,
}

/// Whole minutes from `now` until `at`, rounded toward negative infinity.
pub fn eta_minutes(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (at - now).num_milliseconds().div_euclid(60_000)
}

/// Whole minutes from `now` until the POSIX time `epoch_seconds`.
///
/// Feed times have second resolution, so `now` is truncated to whole
/// seconds before the difference is taken. `None` when the difference
/// does not fit in an `i64`.
pub fn eta_minutes_from_epoch(epoch_seconds: i64, now: DateTime<Utc>) -> Option<i64> {
    epoch_seconds
        .checked_sub(now.timestamp())
        .map(|secs| secs.div_euclid(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_eta_future_whole_minutes() {
        assert_eq!(eta_minutes(noon() + Duration::minutes(7), noon()), 7);
    }

    #[test]
    fn test_eta_floors_partial_minutes() {
        assert_eq!(eta_minutes(noon() + Duration::seconds(119), noon()), 1);
        assert_eq!(eta_minutes(noon() + Duration::seconds(59), noon()), 0);
    }

    #[test]
    fn test_eta_past_floors_downward() {
        assert_eq!(eta_minutes(noon() - Duration::seconds(1), noon()), -1);
        assert_eq!(eta_minutes(noon() - Duration::seconds(60), noon()), -1);
        assert_eq!(eta_minutes(noon() - Duration::seconds(61), noon()), -2);
    }

    #[test]
    fn test_eta_present_is_zero() {
        assert_eq!(eta_minutes(noon(), noon()), 0);
    }

    #[test]
    fn test_eta_from_epoch_ignores_subsecond_now() {
        let now = noon() + Duration::milliseconds(500);
        let epoch = noon().timestamp() + 120;
        assert_eq!(eta_minutes_from_epoch(epoch, now), Some(2));
        assert_eq!(eta_minutes_from_epoch(noon().timestamp() - 30, now), Some(-1));
    }

    #[test]
    fn test_eta_from_epoch_out_of_range() {
        assert_eq!(eta_minutes_from_epoch(i64::MIN, noon()), None);
        let before_epoch = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(eta_minutes_from_epoch(i64::MAX, before_epoch), None);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(Source::Bus.to_string(), "bus");
        assert_eq!(Source::Train.to_string(), "train");
    }
}
