//! Typed access to loosely-typed GeoJSON feature properties.
//!
//! Every accessor carries its own fallback so a missing or mistyped
//! attribute resolves to a known value instead of propagating absence.

use geojson::{Feature, FeatureCollection};
use serde_json::Value as JsonValue;

/// Numeric attribute with a fallback for features that lack it.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericAttribute {
    pub key: String,
    pub default: f64,
}

impl NumericAttribute {
    pub fn new(key: &str, default: f64) -> Self {
        NumericAttribute {
            key: key.to_string(),
            default,
        }
    }

    /// Cell-tower count per district, used by the choropleth.
    pub fn towers() -> Self {
        NumericAttribute::new("TOWERS", 0.0)
    }

    /// Coverage area per tower, used as heatmap weight.
    pub fn area() -> Self {
        NumericAttribute::new("area", 1.0)
    }

    /// Reads the attribute; numeric strings are accepted.
    pub fn get(&self, feature: &Feature) -> f64 {
        feature
            .property(&self.key)
            .and_then(json_to_f64)
            .unwrap_or(self.default)
    }

    /// One value per feature, in feature order.
    pub fn values(&self, collection: &FeatureCollection) -> Vec<f64> {
        collection.features.iter().map(|f| self.get(f)).collect()
    }
}

/// Text attribute with a fallback label.
#[derive(Clone, Debug, PartialEq)]
pub struct TextAttribute {
    pub key: String,
    pub default: String,
}

impl TextAttribute {
    pub fn new(key: &str, default: &str) -> Self {
        TextAttribute {
            key: key.to_string(),
            default: default.to_string(),
        }
    }

    pub fn district_name() -> Self {
        TextAttribute::new("NIMI", "Unknown district")
    }

    pub fn tower_name() -> Self {
        TextAttribute::new("name", "")
    }

    pub fn get(&self, feature: &Feature) -> String {
        match feature.property(&self.key) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(JsonValue::Bool(b)) => b.to_string(),
            _ => self.default.clone(),
        }
    }
}

fn json_to_f64(value: &JsonValue) -> Option<f64> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}
