//! HTTP plumbing shared by both feed clients.
//!
//! Requests go through the [`HttpClient`] trait so credentials can be layered
//! on as wrappers ([`auth::ApiKey`], [`auth::UrlParam`]) around a
//! [`BasicClient`].

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::Bytes;
use reqwest::Url;
use std::time::Duration;

use crate::error::FeedError;

/// Upper bound for a single upstream request, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Parses a configured endpoint into a request URL.
pub fn parse_endpoint(url: &str) -> Result<Url, FeedError> {
    Url::parse(url).map_err(|e| FeedError::InvalidEndpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Issues a GET for `url` and returns the body of a 2xx response.
///
/// The request is bounded by the client's timeout ([`REQUEST_TIMEOUT`] for
/// [`BasicClient::new`]). Connection failures, timeouts and non-2xx
/// statuses all surface as [`FeedError::Transport`].
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: Url) -> Result<Bytes, FeedError> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);
    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?)
}
