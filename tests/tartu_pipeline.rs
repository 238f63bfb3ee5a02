use geojson::{FeatureCollection, Value as GeoValue};
use serde_json::json;
use tartu_viz::engine::choropleth::{PURPLES, bins_for_attribute, palette};
use tartu_viz::engine::transforms::{MAX_ZOOM, collect_bounds};
use tartu_viz::model::properties::NumericAttribute;
use tartu_viz::model::source::parse_feature_collection;
use tartu_viz::{GeoBounds, PixelSize, fit};

const DISTRICTS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"NIMI": "Kesklinn", "TOWERS": 24},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[[26.70, 58.37], [26.74, 58.37], [26.74, 58.39], [26.70, 58.37]]]]}},
    {"type": "Feature", "properties": {"NIMI": "Annelinn", "TOWERS": 9},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[[26.74, 58.36], [26.80, 58.36], [26.80, 58.38], [26.74, 58.36]]]]}},
    {"type": "Feature", "properties": {"NIMI": "Ropka", "TOWERS": 3},
     "geometry": {"type": "Polygon", "coordinates": [[[26.72, 58.34], [26.76, 58.34], [26.76, 58.36], [26.72, 58.34]]]}}
  ]
}"#;

const TOWERS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"name": "T1", "area": 2.5},
     "geometry": {"type": "Point", "coordinates": [26.69, 58.38]}},
    {"type": "Feature", "properties": {"name": "T2"},
     "geometry": {"type": "Point", "coordinates": [26.83, 58.33]}},
    {"type": "Feature", "properties": {"name": "T3"}, "geometry": null}
  ]
}"#;

fn load(doc: &str) -> FeatureCollection {
    parse_feature_collection(doc).unwrap()
}

#[test]
fn fit_frames_districts_and_towers_together() {
    let districts = load(DISTRICTS);
    let towers = load(TOWERS);
    let size = PixelSize::new(1280.0, 720.0);

    let bounds = collect_bounds(&[Some(&districts), Some(&towers)]).unwrap();
    assert_eq!(bounds, GeoBounds::new(26.69, 58.33, 26.83, 58.39));

    let viewport = fit(&[Some(&districts), None, Some(&towers)], size, 20.0).unwrap();
    assert!(bounds.contains(viewport.longitude, viewport.latitude));
    assert!(viewport.zoom > 0.0 && viewport.zoom < MAX_ZOOM);

    let districts_only = fit(&[Some(&districts)], size, 20.0).unwrap();
    assert!(districts_only.zoom >= viewport.zoom);
}

#[test]
fn mixed_geometry_bounds_equal_union_of_parts() {
    let districts = load(DISTRICTS);
    let towers = load(TOWERS);

    let by_type = |keep: fn(&GeoValue) -> bool, source: &FeatureCollection| FeatureCollection {
        bbox: None,
        features: source
            .features
            .iter()
            .filter(|f| f.geometry.as_ref().is_some_and(|g| keep(&g.value)))
            .cloned()
            .collect(),
        foreign_members: None,
    };

    let points = by_type(|v| matches!(v, GeoValue::Point(_)), &towers);
    let polygons = by_type(|v| matches!(v, GeoValue::Polygon(_)), &districts);
    let multipolygons = by_type(|v| matches!(v, GeoValue::MultiPolygon(_)), &districts);
    assert_eq!(points.features.len(), 2);
    assert_eq!(polygons.features.len(), 1);
    assert_eq!(multipolygons.features.len(), 2);

    let union = [&points, &polygons, &multipolygons]
        .iter()
        .map(|c| collect_bounds(&[Some(*c)]).unwrap())
        .reduce(|a, b| a.union(&b))
        .unwrap();
    let combined = collect_bounds(&[Some(&districts), Some(&towers)]).unwrap();
    assert_eq!(union, combined);
}

#[test]
fn choropleth_from_district_attribute() {
    let districts = load(DISTRICTS);
    let colors = palette(&PURPLES);
    let ramp = bins_for_attribute(&districts, &NumericAttribute::towers(), &colors).unwrap();

    assert_eq!(ramp.min(), 3.0);
    assert_eq!(ramp.max(), 24.0);
    let expression = ramp.step_expression("TOWERS");
    assert_eq!(expression[0], json!("step"));
    assert_eq!(expression[2], json!("#f2f0f7"));
    assert_eq!(expression.as_array().unwrap().len(), 3 + 2 * 7);

    assert_eq!(ramp.color_for_value(24.0), &colors[7]);
    assert_eq!(ramp.color_for_value(3.0), &colors[0]);
    assert_eq!(ramp.bins().last().unwrap().label, "21+");
}
