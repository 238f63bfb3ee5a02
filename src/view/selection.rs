use crate::engine::analysis::{self, NearestPoint, Segment};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};

/// Clicks on the advanced view: every clicked point, the tower nearest to
/// the last click, and a line joining the two most recent clicks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    points: Vec<(f64, f64)>,
    nearest: Option<NearestPoint>,
    line: Option<Segment>,
}

impl Selection {
    /// Records a click. Ignored until the tower layer has loaded.
    pub fn click(
        &mut self,
        towers: Option<&FeatureCollection>,
        at: (f64, f64),
    ) -> Option<&NearestPoint> {
        let towers = towers?;
        self.nearest = analysis::nearest_point(towers, at);
        self.points.push(at);
        if let [.., previous, current] = self.points.as_slice() {
            self.line = Some(analysis::line_between(*previous, *current));
        }
        self.nearest.as_ref()
    }

    pub fn clear(&mut self) {
        *self = Selection::default();
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn nearest(&self) -> Option<&NearestPoint> {
        self.nearest.as_ref()
    }

    pub fn line(&self) -> Option<&Segment> {
        self.line.as_ref()
    }

    /// Clicked points as a render source.
    pub fn points_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .points
                .iter()
                .map(|(x, y)| Feature::from(Geometry::new(GeoValue::Point(vec![*x, *y]))))
                .collect(),
            foreign_members: None,
        }
    }
}
