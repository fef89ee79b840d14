//! NOAA NCEI/NGDC Global Historical Tsunami Database client.
//!
//! # API Reference
//!
//! See: <https://www.ngdc.noaa.gov/hazel/view/swagger>
//!
//! # Schema notes
//!
//! The hazard service returns a flat array of tsunami events (a paged
//! `{ "items": [...] }` envelope is accepted too). Numeric fields routinely
//! arrive as `null` or as a non-numeric sentinel such as `"N/A"`; those are
//! treated as absent rather than failing the record.
//!
//! Many historical events only carry a year. The year is kept as the `year`
//! attribute; `observed_at` is set only when year, month and day are all known.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{SourceAdapter, capped, decode_record, fetch_json, lenient_f64, lenient_string};
use crate::error::FetchError;
use crate::model::{HazardEvent, HazardType, Location};

/// Tsunami event list.
pub const NGDC_TSUNAMIS_URL: &str =
    "https://www.ngdc.noaa.gov/hazel/hazard-service/api/v1/tsunamis";

/// Client for the NGDC tsunami event list.
#[derive(Clone)]
pub struct NgdcClient {
    client: reqwest::Client,
    url: String,
}

impl Default for NgdcClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl NgdcClient {
    /// Create a client for the public hazard service.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(client, NGDC_TSUNAMIS_URL)
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
impl SourceAdapter for NgdcClient {
    fn hazard_type(&self) -> HazardType {
        HazardType::Tsunami
    }

    async fn fetch(&self, timeout: Duration) -> Result<Vec<HazardEvent>, FetchError> {
        let payload: NgdcTsunamiPayload = fetch_json(&self.client, &self.url, timeout).await?;
        Ok(normalize(payload))
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Either a bare array of events or a paged envelope. An object without
/// `items` matches neither.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NgdcTsunamiPayload {
    List(Vec<Value>),
    Paged { items: Vec<Value> },
}

impl NgdcTsunamiPayload {
    fn into_records(self) -> Vec<Value> {
        match self {
            NgdcTsunamiPayload::List(records) => records,
            NgdcTsunamiPayload::Paged { items } => items,
        }
    }
}

/// A single tsunami event. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgdcTsunamiEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub location_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,

    /// Magnitude of the generating earthquake.
    #[serde(default, alias = "eqMagnitude", deserialize_with = "lenient_f64")]
    pub earthquake_magnitude: Option<f64>,

    /// Focal depth of the generating earthquake in km.
    #[serde(default, alias = "eqDepth", deserialize_with = "lenient_f64")]
    pub depth: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub year: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub month: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub day: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub hour: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub minute: Option<f64>,

    /// Cause or advisory text.
    #[serde(default, alias = "causeCode", deserialize_with = "lenient_string")]
    pub cause: Option<String>,
}

/// Convert an integral float into an integer, rejecting fractions.
fn whole<T: TryFrom<i64>>(value: Option<f64>) -> Option<T> {
    let v = value?;
    if v.fract() != 0.0 {
        return None;
    }
    T::try_from(v as i64).ok()
}

impl NgdcTsunamiEvent {
    /// Year of the event. Negative years are BCE.
    pub fn year(&self) -> Option<i32> {
        whole(self.year)
    }

    /// Full timestamp, only when the calendar date is completely known.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::from_ymd_opt(self.year()?, whole(self.month)?, whole(self.day)?)?;
        let time = date.and_hms_opt(
            whole(self.hour).unwrap_or(0),
            whole(self.minute).unwrap_or(0),
            0,
        )?;
        Some(time.and_utc())
    }

    /// Epicenter, when both coordinates are present and in range.
    pub fn location(&self) -> Option<Location> {
        Location::new(self.latitude?, self.longitude?)
    }

    fn into_event(self, index: usize) -> HazardEvent {
        let id = self.id.clone().unwrap_or_else(|| format!("ngdc-{}", index));
        let location = self.location();
        let observed_at = self.observed_at();
        let year = self.year().map(|y| y.to_string());
        let depth = self.depth.map(|d| d.to_string());

        HazardEvent::new(HazardType::Tsunami, id)
            .with_location(location)
            .with_magnitude(self.earthquake_magnitude)
            .with_observed_at(observed_at)
            .with_attribute(
                "location_name",
                self.location_name.unwrap_or_else(|| "Unknown Location".to_string()),
            )
            .with_optional_attribute("country", self.country)
            .with_optional_attribute("cause", self.cause)
            .with_optional_attribute("depth_km", depth)
            .with_optional_attribute("year", year)
    }
}

/// Normalize the first ten tsunami records.
pub fn normalize(payload: NgdcTsunamiPayload) -> Vec<HazardEvent> {
    capped(payload.into_records())
        .filter_map(|(index, raw)| {
            decode_record::<NgdcTsunamiEvent>(HazardType::Tsunami, index, raw)
                .map(|event| event.into_event(index))
        })
        .collect()
}
