//! USGS earthquake feed client.
//!
//! The USGS publishes GeoJSON summary feeds of recent earthquakes, updated
//! every minute. We read the "all earthquakes, past hour" feed.
//!
//! # API Reference
//!
//! See: <https://earthquake.usgs.gov/earthquakes/feed/v1.0/geojson.php>
//!
//! # Schema notes
//!
//! `geometry.coordinates` is `[longitude, latitude, depth_km]`. Magnitude and
//! coordinates are required: a feature missing either is skipped.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{SourceAdapter, capped, decode_record, fetch_json};
use crate::error::FetchError;
use crate::model::{HazardEvent, HazardType, Location};

/// Past-hour summary feed of all earthquakes.
pub const USGS_FEED_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_hour.geojson";

/// Client for the USGS earthquake summary feed.
#[derive(Clone)]
pub struct UsgsClient {
    client: reqwest::Client,
    url: String,
}

impl Default for UsgsClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl UsgsClient {
    /// Create a client for the public feed.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(client, USGS_FEED_URL)
    }

    /// Create a client with a custom feed URL (for testing).
    pub fn with_url(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for UsgsClient {
    fn hazard_type(&self) -> HazardType {
        HazardType::Seismic
    }

    async fn fetch(&self, timeout: Duration) -> Result<Vec<HazardEvent>, FetchError> {
        let collection: UsgsFeatureCollection = fetch_json(&self.client, &self.url, timeout).await?;
        Ok(normalize(collection))
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Top-level GeoJSON feature collection. Features are decoded one by one.
///
/// `features` is required: a body without it (e.g. an error object served
/// with a 200) is a parse failure, not an empty feed.
#[derive(Debug, Clone, Deserialize)]
pub struct UsgsFeatureCollection {
    pub features: Vec<Value>,
}

/// A single earthquake feature.
#[derive(Debug, Clone, Deserialize)]
pub struct UsgsFeature {
    /// USGS event id (e.g., "ci40567128").
    #[serde(default)]
    pub id: Option<String>,

    pub properties: UsgsProperties,

    pub geometry: UsgsGeometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsgsProperties {
    /// Magnitude. `null` for some automatic solutions.
    #[serde(default)]
    pub mag: Option<f64>,

    /// Human-readable place description (e.g., "10 km NE of Ridgecrest, CA").
    #[serde(default)]
    pub place: Option<String>,

    /// Origin time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub time: Option<i64>,

    /// Event page on earthquake.usgs.gov.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsgsGeometry {
    /// `[longitude, latitude, depth_km]`.
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl UsgsFeature {
    /// Origin time as a DateTime.
    pub fn origin_time(&self) -> Option<DateTime<Utc>> {
        self.properties.time.and_then(DateTime::from_timestamp_millis)
    }

    /// Depth below the surface in kilometres.
    pub fn depth_km(&self) -> Option<f64> {
        self.geometry.coordinates.get(2).copied()
    }

    fn into_event(self, index: usize) -> Option<HazardEvent> {
        let id = self.id.clone().unwrap_or_else(|| format!("usgs-{}", index));

        let Some(magnitude) = self.properties.mag.filter(|m| m.is_finite()) else {
            warn!(id = %id, "Skipping earthquake without magnitude");
            return None;
        };
        let Some(location) = Location::from_geojson(&self.geometry.coordinates) else {
            warn!(
                id = %id,
                coordinates = ?self.geometry.coordinates,
                "Skipping earthquake without valid coordinates"
            );
            return None;
        };

        let observed_at = self.origin_time();
        let depth = self.depth_km().map(|d| format!("{:.1}", d));

        Some(
            HazardEvent::new(HazardType::Seismic, id)
                .with_location(Some(location))
                .with_magnitude(Some(magnitude))
                .with_observed_at(observed_at)
                .with_optional_attribute("place", self.properties.place)
                .with_optional_attribute("title", self.properties.title)
                .with_optional_attribute("url", self.properties.url)
                .with_optional_attribute("depth_km", depth),
        )
    }
}

/// Normalize a feature collection: first ten features, one event each.
pub fn normalize(collection: UsgsFeatureCollection) -> Vec<HazardEvent> {
    capped(collection.features)
        .filter_map(|(index, raw)| {
            decode_record::<UsgsFeature>(HazardType::Seismic, index, raw)
                .and_then(|feature| feature.into_event(index))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(id: &str, mag: Value, coordinates: Value) -> Value {
        json!({
            "type": "Feature",
            "id": id,
            "properties": {
                "mag": mag,
                "place": "12 km NE of Los Angeles, CA",
                "time": 1_700_000_000_000_i64,
                "url": format!("https://earthquake.usgs.gov/earthquakes/eventpage/{}", id),
                "title": "M 5.2 - 12 km NE of Los Angeles, CA"
            },
            "geometry": { "type": "Point", "coordinates": coordinates }
        })
    }

    fn collection(features: Vec<Value>) -> UsgsFeatureCollection {
        serde_json::from_value(json!({ "type": "FeatureCollection", "features": features }))
            .unwrap()
    }

    #[test]
    fn test_normalize_single_feature() {
        let events = normalize(collection(vec![feature(
            "ci1",
            json!(5.2),
            json!([-118.2, 34.0, 8.4]),
        )]));

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.id, "ci1");
        assert_eq!(event.hazard_type(), HazardType::Seismic);
        assert_eq!(event.primary_magnitude, Some(5.2));

        let location = event.location.unwrap();
        assert_eq!(location.latitude(), 34.0);
        assert_eq!(location.longitude(), -118.2);

        assert_eq!(event.attribute("place"), Some("12 km NE of Los Angeles, CA"));
        assert_eq!(event.attribute("depth_km"), Some("8.4"));
        assert_eq!(event.observed_at, DateTime::from_timestamp(1_700_000_000, 0));
    }

    #[test]
    fn test_normalize_caps_at_ten_in_order() {
        let features = (0..15)
            .map(|i| {
                let mag = json!(1.0 + i as f64 * 0.1);
                feature(&format!("ev{}", i), mag, json!([10.0, 20.0, 5.0]))
            })
            .collect();

        let events = normalize(collection(features));

        assert_eq!(events.len(), 10);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["ev0", "ev1", "ev2", "ev3", "ev4", "ev5", "ev6", "ev7", "ev8", "ev9"]);
    }

    #[test]
    fn test_normalize_skips_invalid_records() {
        let events = normalize(collection(vec![
            feature("no-mag", Value::Null, json!([10.0, 20.0])),
            feature("bad-lat", json!(3.0), json!([10.0, 95.0])),
            feature("short", json!(3.0), json!([10.0])),
            json!({ "id": "no-geometry", "properties": { "mag": 2.0 } }),
            feature("good", json!(4.4), json!([-155.3, 19.4, 1.0])),
        ]));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "good");
    }

    #[test]
    fn test_empty_features_is_empty() {
        assert!(normalize(collection(vec![])).is_empty());
    }

    #[test]
    fn test_missing_features_is_rejected() {
        let body = json!({ "message": "rate limited" });
        let result = serde_json::from_value::<UsgsFeatureCollection>(body);
        assert!(result.is_err());
    }
}
