//! SIRI stop-monitoring JSON → arrival records.
//!
//! The delivery envelope (`Siri.ServiceDelivery.StopMonitoringDelivery[0]`)
//! must be well formed or the whole payload is rejected. Inside a visit,
//! missing or oddly typed leaf fields only fall back to defaults.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::arrival::{ArrivalRecord, Source, eta_minutes};
use crate::error::FeedError;
use crate::normalize::UNKNOWN;

type Object = Map<String, Value>;

/// Agency decorations the stop-monitoring API puts in front of route names.
pub const ROUTE_PREFIXES: [&str; 2] = ["MTA NYCT_", "MTABC_"];

/// Removes a known agency prefix from a `LineRef`, ignoring ASCII case.
pub fn strip_route_prefix(line_ref: &str) -> &str {
    for prefix in ROUTE_PREFIXES {
        if let Some(head) = line_ref.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return &line_ref[prefix.len()..];
            }
        }
    }
    line_ref
}

/// Normalizes a stop-monitoring response into records in upstream order.
///
/// # Errors
///
/// [`FeedError::Payload`] when the delivery envelope or a visit's structure
/// is malformed, [`FeedError::Upstream`] when the API answered with an
/// `ErrorCondition`. No partial results are returned in either case.
pub fn normalize(payload: &Value, now: DateTime<Utc>) -> Result<Vec<ArrivalRecord>, FeedError> {
    let visits = stop_visits(payload)?;
    let records = visits
        .iter()
        .map(|visit| Visit::read(visit).map(|v| v.into_record(now)))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(visits = records.len(), "Stop-monitoring payload normalized");
    Ok(records)
}

fn stop_visits(payload: &Value) -> Result<&[Value], FeedError> {
    let siri = payload
        .as_object()
        .ok_or_else(|| malformed("response is not a JSON object"))?;
    let service = required_object(siri, "Siri")?;
    let delivery = required_object(service, "ServiceDelivery")?;

    let deliveries = delivery
        .get("StopMonitoringDelivery")
        .ok_or_else(|| malformed("missing StopMonitoringDelivery"))?
        .as_array()
        .ok_or_else(|| malformed("StopMonitoringDelivery is not an array"))?;
    let first = deliveries
        .first()
        .ok_or_else(|| malformed("StopMonitoringDelivery is empty"))?
        .as_object()
        .ok_or_else(|| malformed("StopMonitoringDelivery[0] is not an object"))?;

    if let Some(condition) = first.get("ErrorCondition") {
        return Err(FeedError::Upstream(error_condition_text(condition)));
    }

    match first.get("MonitoredStopVisit") {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(visits)) => Ok(visits.as_slice()),
        Some(_) => Err(malformed("MonitoredStopVisit is not an array")),
    }
}

fn error_condition_text(condition: &Value) -> String {
    condition
        .get("Description")
        .and_then(Value::as_str)
        .or_else(|| condition.pointer("/OtherError/ErrorText").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .unwrap_or("unspecified error condition")
        .to_string()
}

fn malformed(reason: &str) -> FeedError {
    FeedError::Payload(reason.to_string())
}

fn required_object<'a>(parent: &'a Object, key: &str) -> Result<&'a Object, FeedError> {
    parent
        .get(key)
        .ok_or_else(|| FeedError::Payload(format!("missing {key}")))?
        .as_object()
        .ok_or_else(|| FeedError::Payload(format!("{key} is not an object")))
}

/// Absent or null yields `None`; any other non-object is a structural fault.
fn optional_object<'a>(parent: &'a Object, key: &str) -> Result<Option<&'a Object>, FeedError> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(FeedError::Payload(format!("{key} is not an object"))),
    }
}

/// Non-empty string field, or `None`.
fn text<'a>(map: Option<&'a Object>, key: &str) -> Option<&'a str> {
    map?.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// The parts of one `MonitoredStopVisit` the normalizer reads.
struct Visit<'a> {
    journey: Option<&'a Object>,
    call: Option<&'a Object>,
}

impl<'a> Visit<'a> {
    fn read(visit: &'a Value) -> Result<Self, FeedError> {
        let visit = visit
            .as_object()
            .ok_or_else(|| malformed("MonitoredStopVisit entry is not an object"))?;
        let journey = optional_object(visit, "MonitoredVehicleJourney")?;
        let call = match journey {
            Some(journey) => optional_object(journey, "MonitoredCall")?,
            None => None,
        };
        Ok(Self { journey, call })
    }

    /// `MonitoredCall.Extensions.Distances`, lenient on shape.
    fn distances(&self) -> Option<&'a Object> {
        self.call?
            .get("Extensions")?
            .get("Distances")?
            .as_object()
    }

    fn into_record(self, now: DateTime<Utc>) -> ArrivalRecord {
        let arrival = text(self.call, "ExpectedArrivalTime").and_then(parse_timestamp);
        let route = text(self.journey, "LineRef")
            .map(strip_route_prefix)
            .unwrap_or(UNKNOWN);
        let stops_away = self
            .distances()
            .and_then(|d| d.get("StopsFromCall"))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);

        ArrivalRecord {
            route: route.to_string(),
            source: Source::Bus,
            location_or_direction: current_location(&self),
            eta_minutes: arrival.map(|at| eta_minutes(at, now)),
            stops_away: Some(stops_away),
            raw_timestamp: arrival,
        }
    }
}

type LocationExtractor = fn(&Visit<'_>) -> Option<String>;

/// Tried in order; the first extractor with a value wins.
const LOCATION_CHAIN: [LocationExtractor; 3] = [presentable_distance, progress_status, origin_ref];

fn current_location(visit: &Visit<'_>) -> String {
    LOCATION_CHAIN
        .iter()
        .find_map(|extract| extract(visit))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn presentable_distance(visit: &Visit<'_>) -> Option<String> {
    text(visit.distances(), "PresentableDistance").map(str::to_string)
}

/// `ProgressStatus` is a plain string in some API versions and a list of
/// status words in others.
fn progress_status(visit: &Visit<'_>) -> Option<String> {
    match visit.journey?.get("ProgressStatus")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let words: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .collect();
            (!words.is_empty()).then(|| words.join(", "))
        }
        _ => None,
    }
}

fn origin_ref(visit: &Visit<'_>) -> Option<String> {
    text(visit.journey, "OriginRef").map(|origin| format!("From {origin}"))
}

/// Parses an ISO-8601 timestamp with offset; a `Z` suffix is read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = match raw.strip_suffix('Z') {
        Some(stem) => format!("{stem}+00:00"),
        None => raw.to_string(),
    };
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
