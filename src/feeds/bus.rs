//! Stop-monitoring (bus) client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::Value;

use crate::arrival::{ArrivalRecord, Source};
use crate::config::BusConfig;
use crate::error::FeedError;
use crate::feeds::ArrivalSource;
use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes, parse_endpoint};
use crate::normalize;

pub const STOP_MONITORING_URL: &str = "https://bustime.mta.info/api/siri/stop-monitoring.json";

/// Visits requested per poll.
pub const MAX_STOP_VISITS: u32 = 10;

pub struct BusFeed<C> {
    client: C,
    endpoint: Url,
    stop_id: String,
    line_ref: Option<String>,
}

impl BusFeed<UrlParam<BasicClient>> {
    /// Client for the public stop-monitoring endpoint with the key sent as `?key=`.
    pub fn new(config: &BusConfig) -> anyhow::Result<Self> {
        let client = UrlParam {
            inner: BasicClient::new()?,
            param_name: "key".to_string(),
            key: config.api_key.clone(),
        };
        Ok(Self::with_client(
            client,
            parse_endpoint(STOP_MONITORING_URL)?,
            &config.stop_id,
            config.line_ref.as_deref(),
        ))
    }
}

impl<C> BusFeed<C> {
    pub fn with_client(client: C, endpoint: Url, stop_id: &str, line_ref: Option<&str>) -> Self {
        Self {
            client,
            endpoint,
            stop_id: stop_id.to_string(),
            line_ref: line_ref.map(str::to_string),
        }
    }

    /// The stop-monitoring query for this stop, without credentials.
    pub fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("MonitoringRef", &self.stop_id)
                .append_pair("MaximumStopVisits", &MAX_STOP_VISITS.to_string());
            if let Some(line_ref) = &self.line_ref {
                query.append_pair("LineRef", line_ref);
            }
        }
        url
    }
}

impl<C: HttpClient> BusFeed<C> {
    /// Fetches the raw stop-monitoring JSON.
    #[tracing::instrument(skip(self), fields(stop_id = %self.stop_id, line_ref = ?self.line_ref))]
    pub async fn fetch(&self) -> Result<Value, FeedError> {
        let bytes = fetch_bytes(&self.client, self.request_url()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl<C: HttpClient> ArrivalSource for BusFeed<C> {
    fn source(&self) -> Source {
        Source::Bus
    }

    async fn arrivals(&self, now: DateTime<Utc>) -> Result<Vec<ArrivalRecord>, FeedError> {
        let payload = self.fetch().await?;
        normalize::bus::normalize(&payload, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        parse_endpoint(STOP_MONITORING_URL).unwrap()
    }

    #[test]
    fn test_request_url_with_line_ref() {
        let feed = BusFeed::with_client((), endpoint(), "308214", Some("MTA NYCT_M15"));
        let url = feed.request_url();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("MonitoringRef".to_string(), "308214".to_string()),
                ("MaximumStopVisits".to_string(), "10".to_string()),
                ("LineRef".to_string(), "MTA NYCT_M15".to_string()),
            ]
        );
        assert_eq!(url.path(), "/api/siri/stop-monitoring.json");
    }

    #[test]
    fn test_request_url_without_line_ref() {
        let feed = BusFeed::with_client((), endpoint(), "308214", None);
        assert!(!feed.request_url().query_pairs().any(|(k, _)| k == "LineRef"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let endpoint = parse_endpoint("http://127.0.0.1:1/api/siri/stop-monitoring.json").unwrap();
        let feed = BusFeed::with_client(BasicClient::new().unwrap(), endpoint, "308214", None);

        let err = feed.arrivals(Utc::now()).await.unwrap_err();
        assert!(matches!(err, FeedError::Transport(_)));
    }
}
