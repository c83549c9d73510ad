//! Upstream feed clients.
//!
//! Each client fetches one payload per poll and runs its normalizer, exposed
//! to the poll loop through [`ArrivalSource`].

pub mod bus;
pub mod routes;
pub mod train;

pub use bus::BusFeed;
pub use routes::SubwayFeed;
pub use train::TrainFeed;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::arrival::{ArrivalRecord, Source};
use crate::error::FeedError;

/// A feed that can produce normalized arrivals for the current tick.
#[async_trait]
pub trait ArrivalSource: Send + Sync {
    fn source(&self) -> Source;

    /// Fetches and normalizes one payload, measuring ETAs against `now`.
    async fn arrivals(&self, now: DateTime<Utc>) -> Result<Vec<ArrivalRecord>, FeedError>;
}
