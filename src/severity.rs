//! Severity classification for map rendering.
//!
//! Pure functions only: no I/O, no state. Each hazard type has its own policy
//! table, and every input maps to exactly one band. Unrecognized or missing
//! values fall back to [`SeverityBand::Unknown`] rendered in blue.
//!
//! Wildfire feeds carry no magnitude or intensity, so every wildfire gets the
//! same [`SeverityBand::Active`] band rather than an invented scale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{HazardEvent, HazardType};

/// Seismic marker radius per unit of magnitude.
const SEISMIC_RADIUS_FACTOR: f64 = 2.0;

/// Discrete severity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBand {
    Minimal,
    Low,
    Moderate,
    Elevated,
    High,
    Severe,
    Extreme,
    /// Hazard is ongoing but the source offers no scale.
    Active,
    /// No usable magnitude or category.
    Unknown,
}

/// Marker color names understood by the map layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Green,
    Yellow,
    Gold,
    Orange,
    Red,
    DarkRed,
    Purple,
    Blue,
}

impl MarkerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Green => "green",
            MarkerColor::Yellow => "yellow",
            MarkerColor::Gold => "gold",
            MarkerColor::Orange => "orange",
            MarkerColor::Red => "red",
            MarkerColor::DarkRed => "darkred",
            MarkerColor::Purple => "purple",
            MarkerColor::Blue => "blue",
        }
    }
}

/// Display attributes attached to a hazard event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Severity {
    pub band: SeverityBand,
    pub color: MarkerColor,

    /// Circle marker radius. Only seismic events scale their marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_radius: Option<f64>,
}

impl Severity {
    const fn new(band: SeverityBand, color: MarkerColor) -> Self {
        Self {
            band,
            color,
            marker_radius: None,
        }
    }

    const UNKNOWN: Severity = Severity::new(SeverityBand::Unknown, MarkerColor::Blue);
}

/// Cyclone category labels and their display attributes.
const CYCLONE_CATEGORIES: [(&str, SeverityBand, MarkerColor); 7] = [
    ("Tropical Depression", SeverityBand::Minimal, MarkerColor::Green),
    ("Tropical Storm", SeverityBand::Low, MarkerColor::Orange),
    ("Category 1", SeverityBand::Moderate, MarkerColor::Yellow),
    ("Category 2", SeverityBand::Elevated, MarkerColor::Gold),
    ("Category 3", SeverityBand::High, MarkerColor::Red),
    ("Category 4", SeverityBand::Severe, MarkerColor::DarkRed),
    ("Category 5", SeverityBand::Extreme, MarkerColor::Purple),
];

/// Classify a hazard by its type, magnitude and attributes.
///
/// # Policies
///
/// - Seismic: `< 4` low/green, `4..6` moderate/orange, `>= 6` high/red.
///   Marker radius is `2 * magnitude`.
/// - Cyclone: lookup of the `category` attribute; unknown labels are
///   unknown/blue.
/// - Tsunami: `>= 8.0` darkred, `>= 6.5` red, `>= 5.0` orange, else yellow;
///   absent magnitude is blue.
/// - Wildfire: always active/red.
pub fn classify(
    hazard_type: HazardType,
    primary_magnitude: Option<f64>,
    attributes: &BTreeMap<String, String>,
) -> Severity {
    let magnitude = primary_magnitude.filter(|m| m.is_finite());

    match hazard_type {
        HazardType::Seismic => classify_seismic(magnitude),
        HazardType::Cyclone => classify_cyclone(attributes.get("category").map(String::as_str)),
        HazardType::Tsunami => classify_tsunami(magnitude),
        HazardType::Wildfire => Severity::new(SeverityBand::Active, MarkerColor::Red),
    }
}

/// Classify a normalized event.
pub fn classify_event(event: &HazardEvent) -> Severity {
    classify(event.hazard_type(), event.primary_magnitude, &event.attributes)
}

fn classify_seismic(magnitude: Option<f64>) -> Severity {
    let Some(m) = magnitude else {
        return Severity::UNKNOWN;
    };

    let (band, color) = if m < 4.0 {
        (SeverityBand::Low, MarkerColor::Green)
    } else if m < 6.0 {
        (SeverityBand::Moderate, MarkerColor::Orange)
    } else {
        (SeverityBand::High, MarkerColor::Red)
    };

    Severity {
        band,
        color,
        marker_radius: Some(m * SEISMIC_RADIUS_FACTOR),
    }
}

fn classify_cyclone(category: Option<&str>) -> Severity {
    category
        .map(str::trim)
        .and_then(|label| {
            CYCLONE_CATEGORIES
                .iter()
                .find(|(known, _, _)| *known == label)
        })
        .map(|(_, band, color)| Severity::new(*band, *color))
        .unwrap_or(Severity::UNKNOWN)
}

fn classify_tsunami(magnitude: Option<f64>) -> Severity {
    match magnitude {
        None => Severity::UNKNOWN,
        Some(m) if m >= 8.0 => Severity::new(SeverityBand::Extreme, MarkerColor::DarkRed),
        Some(m) if m >= 6.5 => Severity::new(SeverityBand::High, MarkerColor::Red),
        Some(m) if m >= 5.0 => Severity::new(SeverityBand::Moderate, MarkerColor::Orange),
        Some(_) => Severity::new(SeverityBand::Low, MarkerColor::Yellow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_attrs() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn category(label: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("category".to_string(), label.to_string())])
    }

    #[test]
    fn test_seismic_moderate_with_radius() {
        let severity = classify(HazardType::Seismic, Some(5.2), &no_attrs());

        assert_eq!(severity.band, SeverityBand::Moderate);
        assert_eq!(severity.color, MarkerColor::Orange);
        assert!((severity.marker_radius.unwrap() - 10.4).abs() < 1e-9);
    }

    #[test]
    fn test_seismic_boundaries() {
        assert_eq!(classify(HazardType::Seismic, Some(3.99), &no_attrs()).band, SeverityBand::Low);
        assert_eq!(
            classify(HazardType::Seismic, Some(4.0), &no_attrs()).band,
            SeverityBand::Moderate
        );
        assert_eq!(
            classify(HazardType::Seismic, Some(5.99), &no_attrs()).band,
            SeverityBand::Moderate
        );
        assert_eq!(classify(HazardType::Seismic, Some(6.0), &no_attrs()).color, MarkerColor::Red);
        assert_eq!(
            classify(HazardType::Seismic, Some(-0.5), &no_attrs()).color,
            MarkerColor::Green
        );
    }

    #[test]
    fn test_cyclone_table() {
        assert_eq!(
            classify(HazardType::Cyclone, None, &category("Category 5")).color,
            MarkerColor::Purple
        );
        assert_eq!(
            classify(HazardType::Cyclone, None, &category("Category 2")).color,
            MarkerColor::Gold
        );
        assert_eq!(
            classify(HazardType::Cyclone, None, &category("Tropical Depression")).color,
            MarkerColor::Green
        );
        assert_eq!(
            classify(HazardType::Cyclone, None, &category("Tropical Storm")).band,
            SeverityBand::Low
        );
    }

    #[test]
    fn test_cyclone_unknown_category_falls_back() {
        for attrs in [category("Post-Tropical Cyclone"), category(""), no_attrs()] {
            let severity = classify(HazardType::Cyclone, Some(3.0), &attrs);
            assert_eq!(severity.band, SeverityBand::Unknown);
            assert_eq!(severity.color, MarkerColor::Blue);
        }
    }

    #[test]
    fn test_tsunami_thresholds() {
        let color = |m| classify(HazardType::Tsunami, m, &no_attrs()).color;

        assert_eq!(color(None), MarkerColor::Blue);
        assert_eq!(color(Some(9.1)), MarkerColor::DarkRed);
        assert_eq!(color(Some(8.0)), MarkerColor::DarkRed);
        assert_eq!(color(Some(6.5)), MarkerColor::Red);
        assert_eq!(color(Some(5.0)), MarkerColor::Orange);
        assert_eq!(color(Some(4.9)), MarkerColor::Yellow);
        assert_eq!(color(Some(0.0)), MarkerColor::Yellow);
    }

    #[test]
    fn test_wildfire_is_fixed() {
        let a = classify(HazardType::Wildfire, None, &no_attrs());
        let b = classify(HazardType::Wildfire, Some(7.0), &category("Category 5"));

        assert_eq!(a, b);
        assert_eq!(a.band, SeverityBand::Active);
        assert_eq!(a.marker_radius, None);
    }

    #[test]
    fn test_non_finite_magnitude_is_unknown() {
        for t in [HazardType::Seismic, HazardType::Tsunami] {
            let severity = classify(t, Some(f64::NAN), &no_attrs());
            assert_eq!(severity.band, SeverityBand::Unknown);
            assert_eq!(severity.marker_radius, None);
        }
    }

    #[test]
    fn test_total_over_sampled_magnitudes() {
        let samples = [None, Some(-1.0), Some(0.0), Some(4.0), Some(6.49), Some(7.0), Some(10.0)];
        for t in HazardType::ALL {
            for m in samples {
                // Deterministic: same input, same output.
                assert_eq!(classify(t, m, &no_attrs()), classify(t, m, &no_attrs()));
            }
        }
    }

    #[test]
    fn test_color_serializes_lowercase() {
        let json = serde_json::to_value(MarkerColor::DarkRed).unwrap();
        assert_eq!(json, "darkred");
        assert_eq!(MarkerColor::DarkRed.as_str(), "darkred");
    }
}
