//! assetd: HTTP delivery for precompiled build artifacts
//!
//! Sits in front of an asset resolver and turns requests into responses:
//! path safety, conditional caching, cache policy for fingerprinted URLs,
//! and in-band rendering of script and stylesheet failures.

pub mod asset;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
