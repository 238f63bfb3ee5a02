use crate::engine::geometry;
use geo::{ConvexHull, Coord, Distance, GeodesicArea, Haversine, Intersects, LineString, MultiPoint, Point, Polygon};
use geojson::{FeatureCollection, Geometry, Position, Value as GeoValue};

// Simple geometric analysis over the tower layer. The heavy lifting is done
// by `geo`; these helpers only convert between GeoJSON and geo types.

#[derive(Clone, Debug, PartialEq)]
pub struct NearestPoint {
    /// Index into the collection's features.
    pub feature_index: usize,
    pub position: (f64, f64),
    pub distance_m: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub geometry: Geometry,
    pub length_m: f64,
}

pub fn tower_points(collection: &FeatureCollection) -> Vec<Point<f64>> {
    geometry::point_features(collection)
        .into_iter()
        .map(|(_, (x, y))| Point::new(x, y))
        .collect()
}

/// Smallest convex polygon around every Point feature, or `None` with fewer
/// than three distinct points.
pub fn convex_hull(collection: &FeatureCollection) -> Option<Geometry> {
    let points = MultiPoint::new(tower_points(collection));
    let hull = points.convex_hull();
    // a closed ring over three distinct points has at least four coordinates
    if hull.exterior().0.len() < 4 {
        return None;
    }
    Some(polygon_to_geojson(&hull))
}

/// Point feature closest to `target` by great-circle distance.
pub fn nearest_point(collection: &FeatureCollection, target: (f64, f64)) -> Option<NearestPoint> {
    let target_point = Point::new(target.0, target.1);
    collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(feature_index, feature)| match feature.geometry.as_ref().map(|g| &g.value) {
            Some(GeoValue::Point(position)) => {
                geometry::position_to_pair(position).map(|position| NearestPoint {
                    feature_index,
                    position,
                    distance_m: Haversine::distance(target_point, Point::new(position.0, position.1)),
                })
            }
            _ => None,
        })
        .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m))
}

/// Indices of the Point features inside a Polygon or MultiPolygon. Points on
/// the boundary count as inside.
pub fn points_within(collection: &FeatureCollection, area: &Geometry) -> Vec<usize> {
    let polygons = to_geo_polygons(area);
    collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| match feature.geometry.as_ref().map(|g| &g.value) {
            Some(GeoValue::Point(position)) => geometry::position_to_pair(position)
                .map(|(x, y)| Point::new(x, y))
                .filter(|point| polygons.iter().any(|polygon| polygon.intersects(point)))
                .map(|_| index),
            _ => None,
        })
        .collect()
}

pub fn line_between(start: (f64, f64), end: (f64, f64)) -> Segment {
    let length_m = Haversine::distance(Point::new(start.0, start.1), Point::new(end.0, end.1));
    Segment {
        geometry: Geometry::new(GeoValue::LineString(vec![
            vec![start.0, start.1],
            vec![end.0, end.1],
        ])),
        length_m,
    }
}

/// Geodesic area in square meters; non-areal geometries measure zero.
pub fn area_m2(area: &Geometry) -> f64 {
    to_geo_polygons(area)
        .iter()
        .map(|polygon| polygon.geodesic_area_unsigned())
        .sum()
}

fn ring_to_line_string(ring: &[Position]) -> LineString<f64> {
    LineString::new(
        ring.iter()
            .filter_map(geometry::position_to_pair)
            .map(|(x, y)| Coord { x, y })
            .collect(),
    )
}

fn rings_to_polygon(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        ring_to_line_string(exterior),
        interiors.iter().map(|ring| ring_to_line_string(ring)).collect(),
    ))
}

fn to_geo_polygons(area: &Geometry) -> Vec<Polygon<f64>> {
    match &area.value {
        GeoValue::Polygon(rings) => rings_to_polygon(rings).into_iter().collect(),
        GeoValue::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings_to_polygon(rings))
            .collect(),
        _ => Vec::new(),
    }
}

fn polygon_to_geojson(polygon: &Polygon<f64>) -> Geometry {
    let ring = |line: &LineString<f64>| -> Vec<Position> {
        line.coords().map(|c| vec![c.x, c.y]).collect()
    };
    let mut rings = vec![ring(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring));
    Geometry::new(GeoValue::Polygon(rings))
}
