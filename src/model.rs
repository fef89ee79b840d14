//! Data models for Hazardwatch.
//!
//! Every upstream feed is normalized into [`HazardEvent`]. Fields that only
//! make sense for one feed live in the free-form `attributes` map; their keys
//! are source-defined and are not unified across hazard types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// Maximum number of records returned by a single fetch of any hazard type.
pub const MAX_EVENTS_PER_FETCH: usize = 10;

/// The kind of hazard a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardType {
    /// Earthquakes (USGS).
    Seismic,
    /// Open wildfire events (NASA EONET).
    Wildfire,
    /// Tropical cyclones and hurricanes (NOAA NHC).
    Cyclone,
    /// Tsunami events (NOAA NGDC).
    Tsunami,
}

impl HazardType {
    /// All hazard types, in the order they are presented.
    pub const ALL: [HazardType; 4] = [
        HazardType::Seismic,
        HazardType::Wildfire,
        HazardType::Cyclone,
        HazardType::Tsunami,
    ];

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            HazardType::Seismic => "Seismic",
            HazardType::Wildfire => "Wildfire",
            HazardType::Cyclone => "Cyclone",
            HazardType::Tsunami => "Tsunami",
        }
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string does not name a hazard type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hazard type: {0}")]
pub struct UnknownHazardType(pub String);

impl FromStr for HazardType {
    type Err = UnknownHazardType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seismic" | "earthquake" | "earthquakes" => Ok(HazardType::Seismic),
            "wildfire" | "wildfires" => Ok(HazardType::Wildfire),
            "cyclone" | "cyclones" | "hurricane" | "hurricanes" => Ok(HazardType::Cyclone),
            "tsunami" | "tsunamis" => Ok(HazardType::Tsunami),
            _ => Err(UnknownHazardType(s.to_string())),
        }
    }
}

/// A validated geographic position.
///
/// Only constructible through [`Location::new`], so a `Location` always has
/// latitude in [-90, 90] and longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    latitude: f64,
    longitude: f64,
}

impl Location {
    /// Build a location, rejecting non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Build a location from a GeoJSON `[longitude, latitude, ...]` array.
    pub fn from_geojson(coordinates: &[f64]) -> Option<Self> {
        match coordinates {
            [lon, lat, ..] => Self::new(*lat, *lon),
            _ => None,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A single normalized hazard record.
///
/// `primary_magnitude` is type-dependent: a Richter-like value for seismic and
/// tsunami records, a Saffir-Simpson ordinal for cyclones and always absent for
/// wildfires. Callers must dispatch on [`HazardEvent::hazard_type`] before
/// comparing magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardEvent {
    /// Display key derived from source fields. Not stable across refetches.
    pub id: String,

    hazard_type: HazardType,

    /// Absent when the source has no usable epicenter. Such records are
    /// carried but not placed on a map.
    pub location: Option<Location>,

    /// Type-dependent magnitude, never non-finite.
    pub primary_magnitude: Option<f64>,

    /// Source-defined free-form fields.
    pub attributes: BTreeMap<String, String>,

    /// Absent when the source gives only a year or no time at all.
    pub observed_at: Option<DateTime<Utc>>,
}

impl HazardEvent {
    /// Create a new event with only the identifying fields set.
    pub fn new(hazard_type: HazardType, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hazard_type,
            location: None,
            primary_magnitude: None,
            attributes: BTreeMap::new(),
            observed_at: None,
        }
    }

    pub fn hazard_type(&self) -> HazardType {
        self.hazard_type
    }

    /// Set the location.
    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Set the magnitude. Non-finite values are stored as absent.
    pub fn with_magnitude(mut self, magnitude: Option<f64>) -> Self {
        self.primary_magnitude = magnitude.filter(|m| m.is_finite());
        self
    }

    /// Set the observation time.
    pub fn with_observed_at(mut self, observed_at: Option<DateTime<Utc>>) -> Self {
        self.observed_at = observed_at;
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Add an attribute only when a value is present.
    pub fn with_optional_attribute(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.with_attribute(key, v),
            None => self,
        }
    }

    /// Look up an attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A hazard event paired with its display severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedEvent {
    #[serde(flatten)]
    pub event: HazardEvent,

    pub severity: Severity,
}

/// Response for GET /events/:hazard.
#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub hazard_type: HazardType,

    /// Number of events returned. Zero means "no current events", not failure.
    pub count: usize,

    pub events: Vec<ClassifiedEvent>,
}

impl EventsResponse {
    pub fn new(hazard_type: HazardType, events: Vec<ClassifiedEvent>) -> Self {
        Self {
            hazard_type,
            count: events.len(),
            events,
        }
    }
}

/// Response for GET /events: every hazard type fetched concurrently.
#[derive(Debug, Clone, Serialize)]
pub struct HazardFeeds {
    pub timestamp: DateTime<Utc>,

    pub feeds: Vec<EventsResponse>,
}

impl HazardFeeds {
    /// Events for one hazard type, if that feed is part of the response.
    pub fn get(&self, hazard_type: HazardType) -> Option<&EventsResponse> {
        self.feeds.iter().find(|f| f.hazard_type == hazard_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_bounds() {
        assert!(Location::new(90.0, 180.0).is_some());
        assert!(Location::new(-90.0, -180.0).is_some());
        assert!(Location::new(90.5, 0.0).is_none());
        assert!(Location::new(0.0, -180.1).is_none());
        assert!(Location::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_location_from_geojson_order() {
        let loc = Location::from_geojson(&[-118.2, 34.0, 10.0]).unwrap();
        assert_eq!(loc.latitude(), 34.0);
        assert_eq!(loc.longitude(), -118.2);

        assert!(Location::from_geojson(&[1.0]).is_none());
    }

    #[test]
    fn test_hazard_type_aliases() {
        assert_eq!("earthquakes".parse::<HazardType>(), Ok(HazardType::Seismic));
        assert_eq!("Hurricane".parse::<HazardType>(), Ok(HazardType::Cyclone));
        assert_eq!("wildfire".parse::<HazardType>(), Ok(HazardType::Wildfire));
        assert!("volcano".parse::<HazardType>().is_err());
    }

    #[test]
    fn test_non_finite_magnitude_is_absent() {
        let event = HazardEvent::new(HazardType::Tsunami, "t1").with_magnitude(Some(f64::NAN));
        assert_eq!(event.primary_magnitude, None);
    }

    #[test]
    fn test_event_serializes_lowercase_type() {
        let event =
            HazardEvent::new(HazardType::Seismic, "us1").with_attribute("place", "Ridgecrest");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["hazard_type"], "seismic");
        assert_eq!(json["attributes"]["place"], "Ridgecrest");
        assert!(json["observed_at"].is_null());
    }
}
