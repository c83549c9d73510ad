pub mod aggregate;
pub mod arrival;
pub mod config;
pub mod error;
pub mod feeds;
pub mod fetch;
pub mod normalize;
pub mod parser;
pub mod poll;
pub mod render;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
