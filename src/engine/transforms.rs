use crate::engine::geometry;
use crate::model::{GeoBounds, PixelSize, Viewport};
use geojson::FeatureCollection;
use std::f64::consts::PI;

// Pure projection and camera-fitting functions for spherical Web Mercator

pub const TILE_SIZE: f64 = 256.0;
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
pub const MIN_ZOOM: f64 = 0.0;
/// Zoom used when the data has no extent to fit (a single point).
pub const MAX_ZOOM: f64 = 20.0;

// Spans below this many zoom-0 pixels are treated as zero
const MIN_PIXEL_SPAN: f64 = 1e-12;

// World pixel x at zoom 0
pub const project_x: fn(f64) -> f64 = |lng| (lng + 180.0) / 360.0 * TILE_SIZE;

// World pixel y at zoom 0, growing southward
pub const project_y: fn(f64) -> f64 = |lat| {
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    TILE_SIZE / (2.0 * PI) * (PI - (PI / 4.0 + phi / 2.0).tan().ln())
};

// Bounding box calculations from coordinates
pub const calculate_bounds_from_coordinates: fn(&[(f64, f64)]) -> Option<GeoBounds> =
    |coordinates| {
        let (&(x, y), rest) = coordinates.split_first()?;
        let mut bounds = GeoBounds::from_point(x, y);
        for &(x, y) in rest {
            bounds.extend(x, y);
        }
        Some(bounds)
    };

/// Combined bounds of every coordinate in every loaded collection.
/// Collections still loading are passed as `None` and contribute nothing.
pub fn collect_bounds(collections: &[Option<&FeatureCollection>]) -> Option<GeoBounds> {
    collections
        .iter()
        .flatten()
        .filter_map(|collection| {
            calculate_bounds_from_coordinates(&geometry::collection_coordinates(collection))
        })
        .reduce(|acc, bounds| acc.union(&bounds))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitOptions {
    /// Margin in pixels kept clear on every side.
    pub padding: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            padding: 20.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl FitOptions {
    pub fn with_padding(padding: f64) -> Self {
        FitOptions {
            padding,
            ..FitOptions::default()
        }
    }
}

/// Largest zoom at which `bounds` plus padding fits in `size`, centered on
/// the box midpoint.
pub fn fit_bounds(bounds: &GeoBounds, size: PixelSize, options: &FitOptions) -> Viewport {
    let (longitude, latitude) = bounds.center();

    let span_x = project_x(bounds.max_x) - project_x(bounds.min_x);
    let span_y = project_y(bounds.min_y) - project_y(bounds.max_y);

    let usable_width = (size.width - 2.0 * options.padding).max(1.0);
    let usable_height = (size.height - 2.0 * options.padding).max(1.0);

    // An axis with no extent places no limit on the zoom
    let scale = [(span_x, usable_width), (span_y, usable_height)]
        .into_iter()
        .filter(|(span, _)| *span > MIN_PIXEL_SPAN)
        .map(|(span, usable)| usable / span)
        .reduce(f64::min);

    let zoom = match scale {
        Some(scale) => scale.log2().clamp(options.min_zoom, options.max_zoom),
        None => options.max_zoom,
    };

    Viewport::new(longitude, latitude, zoom)
}

/// Camera that frames every coordinate of the given collections, or `None`
/// when nothing has loaded yet so the caller keeps its current view.
pub fn fit(
    collections: &[Option<&FeatureCollection>],
    size: PixelSize,
    padding: f64,
) -> Option<Viewport> {
    fit_with(collections, size, &FitOptions::with_padding(padding))
}

pub fn fit_with(
    collections: &[Option<&FeatureCollection>],
    size: PixelSize,
    options: &FitOptions,
) -> Option<Viewport> {
    let bounds = collect_bounds(collections)?;
    let viewport = fit_bounds(&bounds, size, options);
    tracing::debug!(
        "Fitted {:?} into {}x{} -> zoom {:.2}",
        bounds,
        size.width,
        size.height,
        viewport.zoom
    );
    Some(viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Feature, Geometry, Value as GeoValue};

    fn collection(values: Vec<GeoValue>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: values
                .into_iter()
                .map(|v| Feature::from(Geometry::new(v)))
                .collect(),
            foreign_members: None,
        }
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<Vec<f64>> {
        vec![
            vec![x, y],
            vec![x + size, y],
            vec![x + size, y + size],
            vec![x, y + size],
            vec![x, y],
        ]
    }

    #[test]
    fn projection_of_known_points() {
        assert!(project_y(58.35) < project_y(0.0));
        assert_eq!(project_y(89.0), project_y(MAX_LATITUDE));
        assert!((project_x(0.0) - 128.0).abs() < 1e-12);
        assert!((project_y(0.0) - 128.0).abs() < 1e-9);
    }

    #[test]
    fn nothing_loaded_gives_no_fit() {
        let size = PixelSize::new(800.0, 600.0);
        assert_eq!(fit(&[None, None], size, 20.0), None);
        assert_eq!(fit(&[], size, 20.0), None);
        let empty = collection(vec![]);
        assert_eq!(fit(&[Some(&empty), None], size, 20.0), None);
    }

    #[test]
    fn coincident_points_use_max_zoom() {
        let towers = collection(vec![
            GeoValue::Point(vec![26.76, 58.35]),
            GeoValue::Point(vec![26.76, 58.35]),
            GeoValue::MultiPoint(vec![vec![26.76, 58.35]; 3]),
        ]);
        let viewport = fit(&[Some(&towers)], PixelSize::new(1024.0, 768.0), 20.0).unwrap();
        assert_eq!(viewport, Viewport::new(26.76, 58.35, MAX_ZOOM));
    }

    #[test]
    fn fitted_box_fits_and_one_more_zoom_overflows() {
        let districts = collection(vec![GeoValue::Polygon(vec![square(26.6, 58.3, 0.25)])]);
        let size = PixelSize::new(1200.0, 800.0);
        let viewport = fit(&[Some(&districts)], size, 20.0).unwrap();

        let bounds = collect_bounds(&[Some(&districts)]).unwrap();
        let pixel_width = |zoom: f64| (project_x(bounds.max_x) - project_x(bounds.min_x)) * zoom.exp2();
        let pixel_height =
            |zoom: f64| (project_y(bounds.min_y) - project_y(bounds.max_y)) * zoom.exp2();

        assert!(pixel_width(viewport.zoom) <= 1160.0 + 1e-6);
        assert!(pixel_height(viewport.zoom) <= 760.0 + 1e-6);
        // one axis is exactly tight
        let tight_w = (pixel_width(viewport.zoom) - 1160.0).abs() < 1e-6;
        let tight_h = (pixel_height(viewport.zoom) - 760.0).abs() < 1e-6;
        assert!(tight_w || tight_h);
        assert!(viewport.zoom > 8.0 && viewport.zoom < 14.0);
    }

    #[test]
    fn center_is_box_midpoint() {
        let mixed = collection(vec![
            GeoValue::Point(vec![26.5, 58.2]),
            GeoValue::LineString(vec![vec![26.9, 58.5], vec![27.0, 58.45]]),
        ]);
        let viewport = fit(&[Some(&mixed)], PixelSize::new(800.0, 600.0), 0.0).unwrap();
        assert!((viewport.longitude - 26.75).abs() < 1e-12);
        assert!((viewport.latitude - 58.35).abs() < 1e-12);
    }

    #[test]
    fn bounds_union_spans_all_collections() {
        let districts = collection(vec![GeoValue::MultiPolygon(vec![vec![square(26.6, 58.3, 0.1)]])]);
        let towers = collection(vec![GeoValue::Point(vec![27.1, 58.5])]);
        let bounds = collect_bounds(&[Some(&districts), None, Some(&towers)]).unwrap();
        assert_eq!(bounds, GeoBounds::new(26.6, 58.3, 27.1, 58.5));
    }

    #[test]
    fn horizontal_line_is_limited_by_width_only() {
        let line = collection(vec![GeoValue::LineString(vec![vec![26.0, 58.0], vec![27.0, 58.0]])]);
        let viewport = fit(&[Some(&line)], PixelSize::new(512.0, 512.0), 0.0).unwrap();
        let expected = (512.0 / (project_x(27.0) - project_x(26.0))).log2();
        assert!((viewport.zoom - expected).abs() < 1e-9);
    }

    #[test]
    fn whole_world_clamps_to_min_zoom() {
        let world = collection(vec![GeoValue::MultiPoint(vec![vec![-180.0, -85.0], vec![180.0, 85.0]])]);
        let viewport = fit(&[Some(&world)], PixelSize::new(100.0, 100.0), 30.0).unwrap();
        assert_eq!(viewport.zoom, MIN_ZOOM);
        assert!(viewport.zoom.is_finite());
    }

    #[test]
    fn padding_larger_than_viewport_stays_finite() {
        let districts = collection(vec![GeoValue::Polygon(vec![square(26.6, 58.3, 0.25)])]);
        let viewport = fit(&[Some(&districts)], PixelSize::new(30.0, 30.0), 50.0).unwrap();
        assert!(viewport.zoom.is_finite());
        assert!(viewport.zoom >= MIN_ZOOM);
    }

    #[test]
    fn fit_is_deterministic() {
        let districts = collection(vec![GeoValue::Polygon(vec![square(26.6, 58.3, 0.25)])]);
        let size = PixelSize::new(1024.0, 768.0);
        assert_eq!(
            fit(&[Some(&districts)], size, 20.0),
            fit(&[Some(&districts)], size, 20.0)
        );
    }
}
