//! NOAA National Hurricane Center active storms client.
//!
//! # API Reference
//!
//! See: <https://www.nhc.noaa.gov/productexamples/NHC_JSON_Sample.json>
//!
//! # Schema notes
//!
//! Storms arrive as a feature collection. The category label is a free string
//! and is not guaranteed to be one of the Saffir-Simpson labels; unknown labels
//! are kept verbatim and classified as unknown downstream. Storms with missing
//! or invalid coordinates are kept without a location.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{SourceAdapter, capped, decode_record, fetch_json, lenient_string};
use crate::error::FetchError;
use crate::model::{HazardEvent, HazardType, Location};

/// Currently active storms.
pub const NHC_STORMS_URL: &str = "https://www.nhc.noaa.gov/CurrentStorms.json";

/// Client for the NHC active storms feed.
#[derive(Clone)]
pub struct NhcClient {
    client: reqwest::Client,
    url: String,
}

impl Default for NhcClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl NhcClient {
    /// Create a client for the public feed.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(client, NHC_STORMS_URL)
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
impl SourceAdapter for NhcClient {
    fn hazard_type(&self) -> HazardType {
        HazardType::Cyclone
    }

    async fn fetch(&self, timeout: Duration) -> Result<Vec<HazardEvent>, FetchError> {
        let collection: NhcStormCollection = fetch_json(&self.client, &self.url, timeout).await?;
        Ok(normalize(collection))
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct NhcStormCollection {
    pub features: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NhcStorm {
    #[serde(default)]
    pub properties: NhcStormProperties,

    #[serde(default)]
    pub geometry: Option<NhcGeometry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NhcStormProperties {
    /// ATCF storm id (e.g., "al052023").
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    /// Category label (e.g., "Tropical Storm", "Category 3").
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,

    /// Full advisory text.
    #[serde(default, rename = "fullIssue", deserialize_with = "lenient_string")]
    pub full_issue: Option<String>,

    /// Maximum sustained wind in mph. Sometimes published as a string.
    #[serde(default, rename = "windMph", deserialize_with = "lenient_string")]
    pub wind_mph: Option<String>,

    /// Time of the latest advisory (RFC 3339).
    #[serde(default, rename = "lastUpdate", deserialize_with = "lenient_string")]
    pub last_update: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NhcGeometry {
    /// `[longitude, latitude]`.
    #[serde(default)]
    pub coordinates: Vec<Value>,
}

impl NhcGeometry {
    fn location(&self) -> Option<Location> {
        let coordinates: Option<Vec<f64>> = self.coordinates.iter().map(Value::as_f64).collect();
        Location::from_geojson(&coordinates?)
    }
}

/// Normalize a category label. Bare numbers become "Category N".
fn category_label(raw: &str) -> String {
    match raw.parse::<u8>() {
        Ok(n @ 1..=5) => format!("Category {}", n),
        _ => raw.to_string(),
    }
}

/// Saffir-Simpson ordinal for "Category N" labels.
pub fn category_ordinal(label: &str) -> Option<f64> {
    label
        .strip_prefix("Category ")
        .and_then(|n| n.trim().parse::<u8>().ok())
        .filter(|n| (1..=5).contains(n))
        .map(f64::from)
}

impl NhcStorm {
    fn into_event(self, index: usize) -> HazardEvent {
        let props = self.properties;
        let id = props
            .id
            .clone()
            .or_else(|| props.name.clone())
            .unwrap_or_else(|| format!("nhc-{}", index));

        let category = props.category.as_deref().map(category_label);
        let magnitude = category.as_deref().and_then(category_ordinal);
        let location = self.geometry.as_ref().and_then(NhcGeometry::location);
        let observed_at = props
            .last_update
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        HazardEvent::new(HazardType::Cyclone, id)
            .with_location(location)
            .with_magnitude(magnitude)
            .with_observed_at(observed_at)
            .with_attribute("name", props.name.unwrap_or_else(|| "Unknown Storm".to_string()))
            .with_optional_attribute("category", category)
            .with_optional_attribute("advisory", props.full_issue)
            .with_optional_attribute("wind_speed_mph", props.wind_mph)
    }
}

/// Normalize the first ten storms.
pub fn normalize(collection: NhcStormCollection) -> Vec<HazardEvent> {
    capped(collection.features)
        .filter_map(|(index, raw)| {
            decode_record::<NhcStorm>(HazardType::Cyclone, index, raw)
                .map(|storm| storm.into_event(index))
        })
        .collect()
}
