//! The single entry point for hazard data.
//!
//! The [`Aggregator`] owns one [`FeedCache`] per hazard type and composes it
//! with the severity classifier. It never fails a fetch: an empty list is the
//! only failure signal it surfaces, so callers must render an explicit "no
//! current events" state. The one error it does surface is
//! [`SelectError::NotFound`] from [`Aggregator::select_event`].
//!
//! # Usage
//!
//! ```ignore
//! let aggregator = Aggregator::from_config(&Config::from_env())?;
//! let quakes = aggregator.fetch_events(HazardType::Seismic).await;
//! let detail = aggregator.select_event(HazardType::Seismic, &quakes[0].event.id).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{CacheSettings, FeedCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::data_sources::{EonetClient, NgdcClient, NhcClient, SourceAdapter, UsgsClient};
use crate::error::SelectError;
use crate::model::{ClassifiedEvent, EventsResponse, HazardEvent, HazardFeeds, HazardType};
use crate::severity::classify_event;

/// User agent sent to every upstream feed.
const USER_AGENT: &str = concat!("hazardwatch/", env!("CARGO_PKG_VERSION"));

/// Aggregates every hazard feed behind its cache.
#[derive(Clone)]
pub struct Aggregator {
    feeds: Arc<BTreeMap<HazardType, FeedCache>>,
    clock: Arc<dyn Clock>,
}

impl Aggregator {
    /// Build an aggregator over the given adapters. Each adapter gets its own
    /// cache keyed by its hazard type; a later adapter for the same type
    /// replaces an earlier one.
    pub fn new(
        adapters: impl IntoIterator<Item = Arc<dyn SourceAdapter>>,
        clock: Arc<dyn Clock>,
        settings: CacheSettings,
    ) -> Self {
        let feeds = adapters
            .into_iter()
            .map(|adapter| {
                let cache = FeedCache::new(adapter, Arc::clone(&clock), settings);
                (cache.hazard_type(), cache)
            })
            .collect();

        Self {
            feeds: Arc::new(feeds),
            clock,
        }
    }

    /// Build an aggregator over the four public feeds.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        let adapters: [Arc<dyn SourceAdapter>; 4] = [
            Arc::new(UsgsClient::with_url(client.clone(), &config.usgs_url)),
            Arc::new(EonetClient::with_url(client.clone(), &config.eonet_url)),
            Arc::new(NhcClient::with_url(client.clone(), &config.nhc_url)),
            Arc::new(NgdcClient::with_url(client, &config.ngdc_url)),
        ];

        Ok(Self::new(adapters, Arc::new(SystemClock), config.cache_settings()))
    }

    /// Current events for one hazard type, classified, in upstream order.
    ///
    /// Returns an empty list when the feed has nothing or could not be fetched.
    pub async fn fetch_events(&self, hazard_type: HazardType) -> Vec<ClassifiedEvent> {
        let Some(feed) = self.feeds.get(&hazard_type) else {
            warn!(hazard = %hazard_type, "No feed configured");
            return Vec::new();
        };

        feed.get_or_fetch()
            .await
            .into_iter()
            .map(|event| ClassifiedEvent {
                severity: classify_event(&event),
                event,
            })
            .collect()
    }

    /// Look up one event in the most recently fetched list for its type.
    ///
    /// Does not fetch. Fails with [`SelectError::NotFound`] when the id is not
    /// in that list, e.g. because the cache refreshed since the caller listed.
    pub async fn select_event(
        &self,
        hazard_type: HazardType,
        id: &str,
    ) -> Result<HazardEvent, SelectError> {
        let entry = match self.feeds.get(&hazard_type) {
            Some(feed) => feed.snapshot().await,
            None => None,
        };

        entry
            .and_then(|entry| entry.events.into_iter().find(|e| e.id == id))
            .ok_or_else(|| SelectError::NotFound {
                hazard_type,
                id: id.to_string(),
            })
    }

    /// Fetch every hazard type concurrently.
    pub async fn fetch_all(&self) -> HazardFeeds {
        let (seismic, wildfire, cyclone, tsunami) = tokio::join!(
            self.fetch_events(HazardType::Seismic),
            self.fetch_events(HazardType::Wildfire),
            self.fetch_events(HazardType::Cyclone),
            self.fetch_events(HazardType::Tsunami),
        );

        let feeds = vec![
            EventsResponse::new(HazardType::Seismic, seismic),
            EventsResponse::new(HazardType::Wildfire, wildfire),
            EventsResponse::new(HazardType::Cyclone, cyclone),
            EventsResponse::new(HazardType::Tsunami, tsunami),
        ];

        info!(
            counts = ?feeds.iter().map(|f| (f.hazard_type, f.count)).collect::<Vec<_>>(),
            "Fetched all hazard feeds"
        );

        HazardFeeds {
            timestamp: self.clock.now(),
            feeds,
        }
    }
}
