use crate::error::VizError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod properties;
pub mod source;

pub type VizResult<T> = Result<T, VizError>;

/// Axis-aligned box in degrees; x is longitude, y is latitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl GeoBounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        GeoBounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_point(x: f64, y: f64) -> Self {
        GeoBounds::new(x, y, x, y)
    }

    /// Grows the box to cover `(x, y)`.
    pub fn extend(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(&self, other: &GeoBounds) -> GeoBounds {
        GeoBounds::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// A GeoJSON `bbox` member is `[west, south, east, north]`; extra
    /// elevation ordinates are ignored.
    pub fn from_geojson_bbox(bbox: &[f64]) -> Option<GeoBounds> {
        let bounds = match bbox {
            [min_x, min_y, max_x, max_y] => GeoBounds::new(*min_x, *min_y, *max_x, *max_y),
            [min_x, min_y, _, max_x, max_y, _] => GeoBounds::new(*min_x, *min_y, *max_x, *max_y),
            _ => return None,
        };
        (bounds.min_x <= bounds.max_x && bounds.min_y <= bounds.max_y).then_some(bounds)
    }
}

// Pixel size of the map canvas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

impl PixelSize {
    pub fn new(width: f64, height: f64) -> Self {
        PixelSize { width, height }
    }
}

/// Camera position handed to the map engine. Produced fresh by the fitter,
/// never updated in place.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(longitude: f64, latitude: f64, zoom: f64) -> Self {
        Viewport {
            longitude,
            latitude,
            zoom,
        }
    }
}

/// CSS color string, e.g. `#6a51a3`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Color(value.to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
