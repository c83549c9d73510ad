//! Conversion of raw upstream payloads into [`ArrivalRecord`](crate::arrival::ArrivalRecord)s.
//!
//! Each normalizer takes the tick's single `now` sample so that every
//! record built in one poll is measured against the same instant.

pub mod bus;
pub mod train;

/// Placeholder for fields the upstream left out.
pub const UNKNOWN: &str = "Unknown";
