//! Peerlease Server Library
//!
//! Broker that obtains peer network configurations from regional nodes:
//! candidate lookup, sequential fan-out with per-attempt deadlines, and a
//! TTL-cached region listing, served over HTTP.

pub mod api;
pub mod broker;
pub mod cache;
pub mod config;
pub mod directory;
pub mod fetcher;
pub mod observability;
pub mod regions;
pub mod version;

#[cfg(test)]
mod testing;
