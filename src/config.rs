//! Validation of the operator's settings into a runnable [`TrackerConfig`].

use std::time::Duration;
use tracing::{debug, warn};

use crate::arrival::Source;
use crate::error::ConfigError;
use crate::normalize::bus::{ROUTE_PREFIXES, strip_route_prefix};

pub const MIN_REFRESH_SECS: u64 = 5;
pub const DEFAULT_REFRESH_SECS: i64 = 30;
pub const DEFAULT_MAX_BUS_RESULTS: usize = 10;
pub const DEFAULT_MAX_TRAIN_RESULTS: usize = 8;

/// Agency prefix used when the operator gives a bare bus route.
const DEFAULT_LINE_PREFIX: &str = ROUTE_PREFIXES[0];
const BUS_COMPANY_PREFIX: &str = ROUTE_PREFIXES[1];

/// Raw, unvalidated settings as collected from flags and the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bus_api_key: Option<String>,
    pub bus_stop_id: Option<String>,
    pub bus_route_filter: Option<String>,
    pub train_api_key: Option<String>,
    pub train_station_id: Option<String>,
    pub train_route_filter: Option<String>,
    /// Raw operator value; anything below [`MIN_REFRESH_SECS`], negatives
    /// included, is clamped by [`Settings::validate`].
    pub refresh_interval_seconds: i64,
    pub max_bus_results: usize,
    pub max_train_results: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bus_api_key: None,
            bus_stop_id: None,
            bus_route_filter: None,
            train_api_key: None,
            train_station_id: None,
            train_route_filter: None,
            refresh_interval_seconds: DEFAULT_REFRESH_SECS,
            max_bus_results: DEFAULT_MAX_BUS_RESULTS,
            max_train_results: DEFAULT_MAX_TRAIN_RESULTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub api_key: String,
    pub stop_id: String,
    /// Upstream `LineRef`, agency prefix included.
    pub line_ref: Option<String>,
}

impl BusConfig {
    /// Route filter as shown to the operator.
    pub fn route(&self) -> Option<&str> {
        self.line_ref.as_deref().map(strip_route_prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainConfig {
    pub api_key: String,
    pub station_id: String,
    /// Uppercased route id.
    pub route_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub bus: Option<BusConfig>,
    pub train: Option<TrainConfig>,
    pub refresh_interval: Duration,
    pub max_bus_results: usize,
    pub max_train_results: usize,
}

impl Settings {
    /// Checks the settings and fills in derived values.
    ///
    /// A source is enabled when its stop or station is set; it then needs an
    /// API key. Refresh intervals under [`MIN_REFRESH_SECS`] are raised to it.
    pub fn validate(self) -> Result<TrackerConfig, ConfigError> {
        let bus = match (present(self.bus_stop_id), present(self.bus_api_key)) {
            (Some(stop_id), Some(api_key)) => Some(BusConfig {
                api_key,
                stop_id,
                line_ref: present(self.bus_route_filter).map(|route| bus_line_ref(&route)),
            }),
            (Some(_), None) => return Err(ConfigError::MissingApiKey { kind: Source::Bus }),
            (None, key) => {
                if key.is_some() {
                    debug!("Bus API key set without a stop id; bus source disabled");
                }
                None
            }
        };

        let train = match (present(self.train_station_id), present(self.train_api_key)) {
            (Some(station_id), Some(api_key)) => Some(TrainConfig {
                api_key,
                station_id,
                route_filter: present(self.train_route_filter).map(|r| r.to_uppercase()),
            }),
            (Some(_), None) => return Err(ConfigError::MissingApiKey { kind: Source::Train }),
            (None, key) => {
                if key.is_some() {
                    debug!("Subway API key set without a station; train source disabled");
                }
                None
            }
        };

        if bus.is_none() && train.is_none() {
            return Err(ConfigError::NoSourceConfigured);
        }
        if self.max_bus_results == 0 {
            return Err(ConfigError::ZeroLimit { name: "max_bus_results" });
        }
        if self.max_train_results == 0 {
            return Err(ConfigError::ZeroLimit { name: "max_train_results" });
        }

        Ok(TrackerConfig {
            bus,
            train,
            refresh_interval: Duration::from_secs(clamp_refresh(self.refresh_interval_seconds)),
            max_bus_results: self.max_bus_results,
            max_train_results: self.max_train_results,
        })
    }
}

/// Raises intervals below the floor instead of rejecting them.
pub fn clamp_refresh(seconds: i64) -> u64 {
    match u64::try_from(seconds) {
        Ok(secs) if secs >= MIN_REFRESH_SECS => secs,
        _ => {
            warn!(
                requested = seconds,
                minimum = MIN_REFRESH_SECS,
                "Refresh interval below minimum, using minimum"
            );
            MIN_REFRESH_SECS
        }
    }
}

/// Reads a refresh interval as typed by the operator.
///
/// Non-numeric input falls back to [`DEFAULT_REFRESH_SECS`].
pub fn parse_refresh_interval(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or_else(|_| {
        warn!(
            value = raw,
            default = DEFAULT_REFRESH_SECS,
            "Refresh interval is not a number, using default"
        );
        DEFAULT_REFRESH_SECS
    })
}

/// Upstream `LineRef` for an operator-supplied bus route.
///
/// Any agency prefix the operator typed is dropped (ignoring case) and the
/// canonical one re-applied; bus company routes keep their own prefix.
pub fn bus_line_ref(route: &str) -> String {
    let bare = strip_route_prefix(route);
    let is_bus_company = route
        .get(..BUS_COMPANY_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(BUS_COMPANY_PREFIX));

    if is_bus_company {
        format!("{BUS_COMPANY_PREFIX}{bare}")
    } else {
        format!("{DEFAULT_LINE_PREFIX}{bare}")
    }
}

/// Trimmed value, with blank strings treated as unset.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_settings() -> Settings {
        Settings {
            bus_api_key: Some("bus-key".to_string()),
            bus_stop_id: Some("308214".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_refresh_interval_clamped_to_floor() {
        let config = Settings {
            refresh_interval_seconds: 2,
            ..bus_settings()
        }
        .validate()
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_refresh_interval_kept_when_valid() {
        let config = Settings {
            refresh_interval_seconds: 45,
            ..bus_settings()
        }
        .validate()
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(45));
        assert_eq!(clamp_refresh(5), 5);
    }

    #[test]
    fn test_negative_refresh_interval_clamped_to_floor() {
        let config = Settings {
            refresh_interval_seconds: -3,
            ..bus_settings()
        }
        .validate()
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(MIN_REFRESH_SECS));
        assert_eq!(clamp_refresh(i64::MIN), MIN_REFRESH_SECS);
    }

    #[test]
    fn test_parse_refresh_interval() {
        assert_eq!(parse_refresh_interval("45"), 45);
        assert_eq!(parse_refresh_interval(" -3 "), -3);
        assert_eq!(parse_refresh_interval("soon"), DEFAULT_REFRESH_SECS);
        assert_eq!(parse_refresh_interval(""), DEFAULT_REFRESH_SECS);
    }

    #[test]
    fn test_no_source_is_error() {
        assert_eq!(
            Settings::default().validate(),
            Err(ConfigError::NoSourceConfigured)
        );
    }

    #[test]
    fn test_key_without_location_does_not_enable_source() {
        let settings = Settings {
            train_api_key: Some("train-key".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::NoSourceConfigured));
    }

    #[test]
    fn test_blank_values_count_as_absent() {
        let settings = Settings {
            bus_api_key: Some("  ".to_string()),
            bus_stop_id: Some("308214".to_string()),
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::MissingApiKey { kind: Source::Bus })
        );
    }

    #[test]
    fn test_station_without_key_is_error() {
        let settings = Settings {
            train_station_id: Some("R16".to_string()),
            ..bus_settings()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::MissingApiKey { kind: Source::Train })
        );
    }

    #[test]
    fn test_zero_limit_is_error() {
        let settings = Settings {
            max_train_results: 0,
            ..bus_settings()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::ZeroLimit { name: "max_train_results" })
        );
    }

    #[test]
    fn test_both_sources_configured() {
        let config = Settings {
            bus_route_filter: Some("m15".to_string()),
            train_api_key: Some("train-key".to_string()),
            train_station_id: Some(" R16 ".to_string()),
            train_route_filter: Some("q".to_string()),
            ..bus_settings()
        }
        .validate()
        .unwrap();

        let bus = config.bus.unwrap();
        assert_eq!(bus.line_ref.as_deref(), Some("MTA NYCT_m15"));
        assert_eq!(bus.route(), Some("m15"));

        let train = config.train.unwrap();
        assert_eq!(train.station_id, "R16");
        assert_eq!(train.route_filter.as_deref(), Some("Q"));
    }

    #[test]
    fn test_bus_line_ref_normalizes_prefix() {
        assert_eq!(bus_line_ref("M15"), "MTA NYCT_M15");
        assert_eq!(bus_line_ref("MTA NYCT_M15"), "MTA NYCT_M15");
        assert_eq!(bus_line_ref("mta nyct_M15"), "MTA NYCT_M15");
        assert_eq!(bus_line_ref("MTABC_Q53+"), "MTABC_Q53+");
        assert_eq!(bus_line_ref("mtabc_Q53+"), "MTABC_Q53+");
    }
}
