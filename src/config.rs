//! Runtime configuration, read from environment variables.
//!
//! | Variable                     | Default                 |
//! |------------------------------|-------------------------|
//! | `HAZARDWATCH_PORT`           | `3000`                  |
//! | `HAZARDWATCH_TIMEOUT_SECS`   | `10`                    |
//! | `HAZARDWATCH_SERVE_STALE`    | `false`                 |
//! | `HAZARDWATCH_USGS_URL`       | USGS past-hour feed     |
//! | `HAZARDWATCH_EONET_URL`      | EONET open wildfires    |
//! | `HAZARDWATCH_NHC_URL`        | NHC current storms      |
//! | `HAZARDWATCH_NGDC_URL`       | NGDC tsunami events     |
//!
//! The cache TTL is fixed and deliberately not configurable.

use std::env;
use std::time::Duration;

use crate::cache::{CacheSettings, DEFAULT_TIMEOUT, FailurePolicy};
use crate::data_sources::eonet::EONET_WILDFIRES_URL;
use crate::data_sources::ngdc::NGDC_TSUNAMIS_URL;
use crate::data_sources::nhc::NHC_STORMS_URL;
use crate::data_sources::usgs::USGS_FEED_URL;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub request_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub usgs_url: String,
    pub eonet_url: String,
    pub nhc_url: String,
    pub ngdc_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            request_timeout: DEFAULT_TIMEOUT,
            failure_policy: FailurePolicy::ServeEmpty,
            usgs_url: USGS_FEED_URL.to_string(),
            eonet_url: EONET_WILDFIRES_URL.to_string(),
            nhc_url: NHC_STORMS_URL.to_string(),
            ngdc_url: NGDC_TSUNAMIS_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Unset or unparsable
    /// values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("HAZARDWATCH_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let request_timeout = lookup("HAZARDWATCH_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let failure_policy = match lookup("HAZARDWATCH_SERVE_STALE").as_deref() {
            Some("1" | "true" | "yes") => FailurePolicy::ServeStale,
            _ => FailurePolicy::ServeEmpty,
        };

        Self {
            port,
            request_timeout,
            failure_policy,
            usgs_url: lookup("HAZARDWATCH_USGS_URL").unwrap_or(defaults.usgs_url),
            eonet_url: lookup("HAZARDWATCH_EONET_URL").unwrap_or(defaults.eonet_url),
            nhc_url: lookup("HAZARDWATCH_NHC_URL").unwrap_or(defaults.nhc_url),
            ngdc_url: lookup("HAZARDWATCH_NGDC_URL").unwrap_or(defaults.ngdc_url),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            timeout: self.request_timeout,
            failure_policy: self.failure_policy,
        }
    }
}
