//! NASA EONET (Earth Observatory Natural Event Tracker) wildfire client.
//!
//! EONET curates natural events from many upstream sources (InciWeb, GDACS,
//! IRWIN, ...) and publishes each event with one or more dated geometries.
//!
//! # API Reference
//!
//! See: <https://eonet.gsfc.nasa.gov/docs/v3>
//!
//! # Fan-out
//!
//! A single wildfire event is often observed at several points. Each point
//! geometry becomes its own [`HazardEvent`], sharing the event's title and
//! source URL: an event with three points yields three records. Polygon
//! geometries are not placeable as markers and are skipped.
//!
//! The upstream list is truncated to ten source events before fan-out, and the
//! fanned-out records are truncated to ten again, so a fetch never returns
//! more than ten records.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{SourceAdapter, capped, decode_record, fetch_json};
use crate::error::FetchError;
use crate::model::{HazardEvent, HazardType, Location, MAX_EVENTS_PER_FETCH};

/// Open wildfire events.
pub const EONET_WILDFIRES_URL: &str =
    "https://eonet.gsfc.nasa.gov/api/v3/events?status=open&category=wildfires";

/// Title used when an event has none.
const DEFAULT_TITLE: &str = "Wildfire";

/// Client for the EONET wildfire event list.
#[derive(Clone)]
pub struct EonetClient {
    client: reqwest::Client,
    url: String,
}

impl Default for EonetClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl EonetClient {
    /// Create a client for the public event list.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(client, EONET_WILDFIRES_URL)
    }

    /// Create a client with a custom URL (for testing).
    pub fn with_url(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for EonetClient {
    fn hazard_type(&self) -> HazardType {
        HazardType::Wildfire
    }

    async fn fetch(&self, timeout: Duration) -> Result<Vec<HazardEvent>, FetchError> {
        let response: EonetEventsResponse = fetch_json(&self.client, &self.url, timeout).await?;
        Ok(normalize(response))
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Response from the EONET events endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EonetEventsResponse {
    pub events: Vec<Value>,
}

/// A single natural event.
#[derive(Debug, Clone, Deserialize)]
pub struct EonetEvent {
    /// EONET id (e.g., "EONET_6490").
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Upstream sources reporting the event.
    #[serde(default)]
    pub sources: Vec<EonetSource>,

    /// Dated observations, oldest first.
    #[serde(default)]
    pub geometry: Vec<EonetGeometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EonetSource {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub url: Option<String>,
}

/// One observation. `coordinates` is `[lon, lat]` for points and nested rings
/// for polygons.
#[derive(Debug, Clone, Deserialize)]
pub struct EonetGeometry {
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub coordinates: Value,
}

impl EonetGeometry {
    /// The point location, if this geometry is a valid `[lon, lat]` pair.
    pub fn point(&self) -> Option<Location> {
        match self.coordinates.as_array()?.as_slice() {
            [lon, lat] => Location::new(lat.as_f64()?, lon.as_f64()?),
            _ => None,
        }
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl EonetEvent {
    /// URL of the first reporting source.
    pub fn source_url(&self) -> Option<&str> {
        self.sources.first().and_then(|s| s.url.as_deref())
    }

    /// Fan the event out into one record per point geometry.
    fn into_events(self, index: usize) -> Vec<HazardEvent> {
        let id = self.id.clone().unwrap_or_else(|| format!("eonet-{}", index));
        let title = self.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let source_url = self.source_url().map(str::to_string);

        self.geometry
            .iter()
            .enumerate()
            .filter_map(|(n, geometry)| {
                let Some(location) = geometry.point() else {
                    debug!(
                        id = %id,
                        geometry = n,
                        kind = ?geometry.kind,
                        "Skipping non-point geometry"
                    );
                    return None;
                };

                Some(
                    HazardEvent::new(HazardType::Wildfire, format!("{}-p{}", id, n))
                        .with_location(Some(location))
                        .with_observed_at(geometry.observed_at())
                        .with_attribute("title", title.clone())
                        .with_optional_attribute("source_url", source_url.clone()),
                )
            })
            .collect()
    }
}

/// Normalize the first ten wildfire events, fanning out per point and keeping
/// at most ten records.
pub fn normalize(response: EonetEventsResponse) -> Vec<HazardEvent> {
    let mut events = Vec::new();

    for (index, raw) in capped(response.events) {
        if events.len() >= MAX_EVENTS_PER_FETCH {
            break;
        }
        if let Some(event) = decode_record::<EonetEvent>(HazardType::Wildfire, index, raw) {
            events.extend(event.into_events(index));
        }
    }

    events.truncate(MAX_EVENTS_PER_FETCH);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(lon: f64, lat: f64) -> Value {
        json!({ "date": "2024-08-01T12:00:00Z", "type": "Point", "coordinates": [lon, lat] })
    }

    fn wildfire(id: &str, geometry: Vec<Value>) -> Value {
        json!({
            "id": id,
            "title": format!("{} Fire", id),
            "sources": [{ "id": "InciWeb", "url": format!("https://inciweb.example/{}", id) }],
            "geometry": geometry
        })
    }

    fn response(events: Vec<Value>) -> EonetEventsResponse {
        serde_json::from_value(json!({ "title": "EONET Events", "events": events })).unwrap()
    }

    #[test]
    fn test_fan_out_per_point() {
        let events = normalize(response(vec![wildfire(
            "EONET_1",
            vec![point(-120.5, 38.1), point(-120.6, 38.2), point(-120.7, 38.3)],
        )]));

        assert_eq!(events.len(), 3);

        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["EONET_1-p0", "EONET_1-p1", "EONET_1-p2"]);

        for event in &events {
            assert_eq!(event.hazard_type(), HazardType::Wildfire);
            assert_eq!(event.attribute("title"), Some("EONET_1 Fire"));
            assert_eq!(event.attribute("source_url"), Some("https://inciweb.example/EONET_1"));
            assert_eq!(event.primary_magnitude, None);
        }

        assert_eq!(events[1].location.unwrap().longitude(), -120.6);
        assert_eq!(events[2].location.unwrap().latitude(), 38.3);
        assert_eq!(events[0].observed_at, DateTime::from_timestamp(1_722_513_600, 0));
    }

    #[test]
    fn test_polygons_and_bad_points_are_skipped() {
        let polygon = json!({
            "type": "Polygon",
            "coordinates": [[[-120.0, 38.0], [-121.0, 38.0], [-121.0, 39.0], [-120.0, 38.0]]]
        });
        let events = normalize(response(vec![wildfire(
            "EONET_2",
            vec![polygon, point(-200.0, 10.0), point(10.0, 10.0)],
        )]));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "EONET_2-p2");
    }

    #[test]
    fn test_missing_title_and_sources() {
        let events = normalize(response(vec![json!({
            "id": "EONET_3",
            "geometry": [point(1.0, 2.0)]
        })]));

        assert_eq!(events[0].attribute("title"), Some("Wildfire"));
        assert_eq!(events[0].attribute("source_url"), None);
    }

    #[test]
    fn test_record_cap_after_fan_out() {
        let many_points = (0..4).map(|i| point(i as f64, 0.0)).collect::<Vec<_>>();
        let source_events = (0..5)
            .map(|i| wildfire(&format!("EONET_{}", i), many_points.clone()))
            .collect();

        let events = normalize(response(source_events));

        assert_eq!(events.len(), MAX_EVENTS_PER_FETCH);
        assert_eq!(events[0].id, "EONET_0-p0");
        assert_eq!(events[9].id, "EONET_2-p1");
    }

    #[test]
    fn test_source_event_cap() {
        // Twelve single-point events: only the first ten source events count.
        let source_events = (0..12)
            .map(|i| wildfire(&format!("F{}", i), vec![point(0.0, i as f64)]))
            .collect();

        let events = normalize(response(source_events));

        assert_eq!(events.len(), 10);
        assert_eq!(events.last().unwrap().id, "F9-p0");
    }

    #[test]
    fn test_missing_events_is_rejected() {
        let body = json!({ "title": "EONET Events" });
        let result = serde_json::from_value::<EonetEventsResponse>(body);
        assert!(result.is_err());
    }
}
