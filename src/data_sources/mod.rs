//! Source adapters for the upstream hazard feeds.
//!
//! Each adapter owns one endpoint URL and that endpoint's schema, and turns a
//! payload into an ordered list of [`HazardEvent`]s. Adapters share no state.
//!
//! # Data Sources
//!
//! - [`usgs`]: USGS earthquake GeoJSON summary feed (seismic)
//! - [`eonet`]: NASA EONET open wildfire events (wildfire, fans out per point)
//! - [`nhc`]: NOAA National Hurricane Center active storms (cyclone)
//! - [`ngdc`]: NOAA NGDC hazard service tsunami list (tsunami)
//!
//! # Record handling
//!
//! Every adapter truncates the upstream collection to
//! [`MAX_EVENTS_PER_FETCH`] before normalizing, and decodes records one at a
//! time: a malformed record is logged and skipped, never failing the fetch.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::{DeserializeOwned, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::model::{HazardEvent, HazardType, MAX_EVENTS_PER_FETCH};

pub mod eonet;
pub mod ngdc;
pub mod nhc;
pub mod usgs;

pub use eonet::EonetClient;
pub use ngdc::NgdcClient;
pub use nhc::NhcClient;
pub use usgs::UsgsClient;

/// One upstream hazard feed.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The hazard type every returned event carries.
    fn hazard_type(&self) -> HazardType;

    /// Fetch and normalize the current feed, in upstream order.
    async fn fetch(&self, timeout: Duration) -> Result<Vec<HazardEvent>, FetchError>;
}

/// GET `url` and decode the JSON body.
///
/// Non-2xx responses become [`FetchError::HttpStatus`], undecodable bodies
/// [`FetchError::Parse`], and an elapsed `timeout` [`FetchError::Timeout`].
pub async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<T, FetchError> {
    let response = client.get(url).timeout(timeout).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let body = response.bytes().await?;
    debug!(url, bytes = body.len(), "Fetched upstream payload");

    Ok(serde_json::from_slice(&body)?)
}

/// Truncate a raw upstream collection to the per-fetch cap.
pub(crate) fn capped(records: Vec<Value>) -> impl Iterator<Item = (usize, Value)> {
    records.into_iter().take(MAX_EVENTS_PER_FETCH).enumerate()
}

/// Decode one raw record into its typed schema, logging and skipping it on
/// failure.
pub(crate) fn decode_record<T: DeserializeOwned>(
    hazard_type: HazardType,
    index: usize,
    raw: Value,
) -> Option<T> {
    match serde_json::from_value(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(hazard = %hazard_type, index, error = %e, "Skipping malformed record");
            None
        }
    }
}

/// Read a numeric field that may arrive as a number, a numeric string, `null`,
/// or a non-numeric sentinel such as `"N/A"`. Anything non-numeric is absent.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(number.filter(|n| n.is_finite()))
}

/// Read a free-text field that may arrive as a string or a number. Empty
/// strings are absent.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_f64")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "lenient_string")]
        label: Option<String>,
    }

    fn sample(json: Value) -> Sample {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_lenient_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(sample(serde_json::json!({ "value": 6.1 })).value, Some(6.1));
        assert_eq!(sample(serde_json::json!({ "value": " 7.5 " })).value, Some(7.5));
        assert_eq!(sample(serde_json::json!({ "value": 3 })).value, Some(3.0));
    }

    #[test]
    fn test_lenient_f64_sentinels_are_absent() {
        assert_eq!(sample(serde_json::json!({ "value": "N/A" })).value, None);
        assert_eq!(sample(serde_json::json!({ "value": null })).value, None);
        assert_eq!(sample(serde_json::json!({ "value": true })).value, None);
        assert_eq!(sample(serde_json::json!({})).value, None);
    }

    #[test]
    fn test_lenient_string() {
        assert_eq!(sample(serde_json::json!({ "label": 85 })).label.as_deref(), Some("85"));
        assert_eq!(sample(serde_json::json!({ "label": "  " })).label, None);
        let named = sample(serde_json::json!({ "label": "Hilary" }));
        assert_eq!(named.label.as_deref(), Some("Hilary"));
    }

    #[test]
    fn test_capped_truncates_in_order() {
        let raw: Vec<Value> = (0..25).map(Value::from).collect();
        let kept: Vec<(usize, Value)> = capped(raw).collect();

        assert_eq!(kept.len(), MAX_EVENTS_PER_FETCH);
        assert_eq!(kept[0], (0, Value::from(0)));
        assert_eq!(kept[9], (9, Value::from(9)));
    }

    #[test]
    fn test_decode_record_skips_malformed() {
        let ok: Option<Sample> = decode_record(HazardType::Tsunami, 0, serde_json::json!({}));
        assert!(ok.is_some());

        let bad: Option<Sample> = decode_record(HazardType::Tsunami, 1, serde_json::json!("oops"));
        assert!(bad.is_none());
    }
}
