use geojson::{Feature, FeatureCollection, Geometry, Position, Value as GeoValue};

// Pure coordinate extraction functions. Coordinates come out as (lon, lat).

// A position needs two finite ordinates; anything else is dropped
pub const position_to_pair: fn(&Position) -> Option<(f64, f64)> =
    |position| match position.as_slice() {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some((*x, *y)),
        _ => None,
    };

pub const flatten_positions: fn(&[Position]) -> Vec<(f64, f64)> =
    |positions| positions.iter().filter_map(position_to_pair).collect();

// Unwraps each geometry type by its nesting depth
pub const extract_coordinates: fn(&Geometry) -> Vec<(f64, f64)> =
    |geometry| match &geometry.value {
        GeoValue::Point(position) => position_to_pair(position).into_iter().collect(),
        GeoValue::MultiPoint(positions) | GeoValue::LineString(positions) => {
            flatten_positions(positions)
        }
        GeoValue::Polygon(rings) | GeoValue::MultiLineString(rings) => rings
            .iter()
            .flat_map(|ring| flatten_positions(ring))
            .collect(),
        GeoValue::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .flat_map(|ring| flatten_positions(ring))
            .collect(),
        // not one of the six fitted types
        GeoValue::GeometryCollection(_) => Vec::new(),
    };

pub const feature_coordinates: fn(&Feature) -> Vec<(f64, f64)> =
    |feature| {
        feature
            .geometry
            .as_ref()
            .map(extract_coordinates)
            .unwrap_or_default()
    };

pub const collection_coordinates: fn(&FeatureCollection) -> Vec<(f64, f64)> =
    |collection| {
        collection
            .features
            .iter()
            .flat_map(feature_coordinates)
            .collect()
    };

// Point features only, paired with their feature for attribute lookups
pub fn point_features(collection: &FeatureCollection) -> Vec<(&Feature, (f64, f64))> {
    collection
        .features
        .iter()
        .filter_map(|feature| match feature.geometry.as_ref().map(|g| &g.value) {
            Some(GeoValue::Point(position)) => position_to_pair(position).map(|p| (feature, p)),
            _ => None,
        })
        .collect()
}
