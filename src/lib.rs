//! Hazardwatch - near-real-time natural hazard feeds.
//!
//! # Overview
//!
//! Hazardwatch ingests seismic, wildfire, tropical cyclone and tsunami events
//! from four independent upstream feeds with incompatible schemas, normalizes
//! them into one [`model::HazardEvent`] record, caches each feed for ten
//! minutes, and attaches the severity band and marker color map rendering
//! needs.
//!
//! A failure in one feed never affects the other three: a failed fetch
//! surfaces as an empty list, not an error.
//!
//! # Modules
//!
//! - [`model`]: Normalized hazard records and API response types
//! - [`data_sources`]: One adapter per upstream feed
//! - [`severity`]: Pure severity/color classification
//! - [`cache`]: Per-feed TTL cache with single-flight refresh
//! - [`aggregator`]: The entry point composing cache and classifier
//! - [`api`]: HTTP API handlers
//! - [`config`]: Environment configuration

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod model;
pub mod severity;

#[cfg(test)]
mod testing;
