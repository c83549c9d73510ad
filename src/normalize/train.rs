//! GTFS-realtime trip updates → arrival records for one station.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::arrival::{ArrivalRecord, Source, eta_minutes_from_epoch};
use crate::gtfs_rt::trip_update::stop_time_update::ScheduleRelationship;
use crate::gtfs_rt::trip_update::StopTimeUpdate;
use crate::gtfs_rt::FeedMessage;
use crate::normalize::UNKNOWN;

pub const UPTOWN: &str = "Uptown";
pub const DOWNTOWN: &str = "Downtown";

/// Station id with the trailing `N`/`S` platform suffix removed.
pub fn station_of(stop_id: &str) -> &str {
    stop_id
        .strip_suffix('N')
        .or_else(|| stop_id.strip_suffix('S'))
        .unwrap_or(stop_id)
}

/// Only an exact `N` suffix is northbound.
pub fn direction_of(stop_id: &str) -> &'static str {
    if stop_id.ends_with('N') {
        UPTOWN
    } else {
        DOWNTOWN
    }
}

/// Collects upcoming arrivals at `station` from every trip update in `feed`.
///
/// `route_filter` is uppercased and compared exactly against the trip's
/// `route_id`. Updates without any time, and trains that already left
/// (negative ETA), are dropped. The result is ordered by the raw epoch time.
pub fn normalize(
    feed: &FeedMessage,
    station: &str,
    route_filter: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<ArrivalRecord> {
    let route_filter = route_filter.map(str::to_uppercase);
    let mut candidates: Vec<(i64, ArrivalRecord)> = Vec::new();

    for entity in &feed.entity {
        if entity.is_deleted() {
            continue;
        }
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };

        let route_id = trip_update.trip.route_id.as_deref();
        if let Some(filter) = &route_filter {
            if route_id != Some(filter.as_str()) {
                continue;
            }
        }
        let route = route_id.filter(|r| !r.is_empty()).unwrap_or(UNKNOWN);

        for update in &trip_update.stop_time_update {
            if let Some((epoch, record)) = stop_arrival(update, station, route, now) {
                candidates.push((epoch, record));
            }
        }
    }

    candidates.sort_by_key(|(epoch, _)| *epoch);
    debug!(station, arrivals = candidates.len(), "Trip updates normalized");

    candidates.into_iter().map(|(_, record)| record).collect()
}

fn stop_arrival(
    update: &StopTimeUpdate,
    station: &str,
    route: &str,
    now: DateTime<Utc>,
) -> Option<(i64, ArrivalRecord)> {
    if update.schedule_relationship() == ScheduleRelationship::Skipped {
        return None;
    }

    let stop_id = update.stop_id.as_deref()?;
    if station_of(stop_id) != station {
        return None;
    }

    let epoch = update
        .arrival
        .as_ref()
        .and_then(|event| event.time)
        .or_else(|| update.departure.as_ref().and_then(|event| event.time))?;

    // Times chrono cannot represent are corrupt, not far-future arrivals.
    let at = DateTime::from_timestamp(epoch, 0)?;
    let eta = eta_minutes_from_epoch(epoch, now)?;
    if eta < 0 {
        return None;
    }

    let record = ArrivalRecord {
        route: route.to_string(),
        source: Source::Train,
        location_or_direction: direction_of(stop_id).to_string(),
        eta_minutes: Some(eta),
        stops_away: None,
        raw_timestamp: Some(at),
    };
    Some((epoch, record))
}
