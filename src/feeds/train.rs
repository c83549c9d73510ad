//! GTFS-realtime (subway) client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::arrival::{ArrivalRecord, Source};
use crate::config::TrainConfig;
use crate::error::FeedError;
use crate::feeds::{ArrivalSource, SubwayFeed};
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes, parse_endpoint};
use crate::gtfs_rt::FeedMessage;
use crate::normalize;
use crate::parser::parse_feed;

pub const API_KEY_HEADER: &str = "x-api-key";

pub struct TrainFeed<C> {
    client: C,
    feed: SubwayFeed,
    endpoint: Url,
    station_id: String,
    route_filter: Option<String>,
}

impl TrainFeed<ApiKey<BasicClient>> {
    /// Client for the feed that carries the configured route.
    pub fn new(config: &TrainConfig) -> anyhow::Result<Self> {
        let client = ApiKey::new(BasicClient::new()?, API_KEY_HEADER, &config.api_key)?;
        let feed = SubwayFeed::for_route(config.route_filter.as_deref());
        Ok(Self::with_client(
            client,
            feed,
            parse_endpoint(&feed.url())?,
            &config.station_id,
            config.route_filter.as_deref(),
        ))
    }
}

impl<C> TrainFeed<C> {
    pub fn with_client(
        client: C,
        feed: SubwayFeed,
        endpoint: Url,
        station_id: &str,
        route_filter: Option<&str>,
    ) -> Self {
        Self {
            client,
            feed,
            endpoint,
            station_id: station_id.to_string(),
            route_filter: route_filter.map(str::to_string),
        }
    }

    pub fn feed(&self) -> SubwayFeed {
        self.feed
    }
}

impl<C: HttpClient> TrainFeed<C> {
    /// Fetches and decodes the feed message.
    #[tracing::instrument(skip(self), fields(feed = %self.feed, station = %self.station_id))]
    pub async fn fetch(&self) -> Result<FeedMessage, FeedError> {
        let bytes = fetch_bytes(&self.client, self.endpoint.clone()).await?;
        parse_feed(&bytes)
    }
}

#[async_trait]
impl<C: HttpClient> ArrivalSource for TrainFeed<C> {
    fn source(&self) -> Source {
        Source::Train
    }

    async fn arrivals(&self, now: DateTime<Utc>) -> Result<Vec<ArrivalRecord>, FeedError> {
        let feed = self.fetch().await?;
        Ok(normalize::train::normalize(
            &feed,
            &self.station_id,
            self.route_filter.as_deref(),
            now,
        ))
    }
}
