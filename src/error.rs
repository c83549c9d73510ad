//! Error taxonomy for feed fetching and startup configuration.
//!
//! [`FeedError`] never escapes a poll tick: the failing source yields no
//! arrivals for that tick and the message is shown next to its board.
//! [`ConfigError`] is fatal and stops the process before the first tick.

use crate::arrival::Source;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Payload(e.to_string())
    }
}

impl From<prost::DecodeError> for FeedError {
    fn from(e: prost::DecodeError) -> Self {
        FeedError::Payload(e.to_string())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no arrival source configured: set a bus stop id and/or a subway station")]
    NoSourceConfigured,

    #[error("{kind} source requested but its API key is missing")]
    MissingApiKey { kind: Source },

    #[error("{name} must be at least 1")]
    ZeroLimit { name: &'static str },
}
