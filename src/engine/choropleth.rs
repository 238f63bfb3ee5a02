//! Equal-width binning of a numeric attribute onto a fixed color palette.
//!
//! The result drives both the fill color of each district (a `step`
//! expression for the map engine) and the legend.

use crate::error::VizError;
use crate::model::properties::NumericAttribute;
use crate::model::{Color, VizResult};
use geojson::FeatureCollection;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

/// Sequential purple ramp used for the tower-count choropleth.
pub const PURPLES: [&str; 8] = [
    "#f2f0f7", "#dadaeb", "#bcbddc", "#9e9ac8", "#807dba", "#6a51a3", "#54278f", "#3f007d",
];

pub fn palette(colors: &[&str]) -> Vec<Color> {
    colors.iter().map(|c| Color::from(*c)).collect()
}

/// One legend entry. `upper` is `None` for the open-ended last bin.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorBin {
    pub lower: f64,
    pub upper: Option<f64>,
    pub color: Color,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorRamp {
    min: f64,
    max: f64,
    thresholds: Vec<f64>,
    palette: Vec<Color>,
    bins: Vec<ColorBin>,
}

impl ColorRamp {
    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Interior break points, ascending. Empty when every value was equal.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn bins(&self) -> &[ColorBin] {
        &self.bins
    }

    /// Step lookup: intervals are closed on the left, open on the right,
    /// and the last one has no upper bound.
    pub fn color_for_value(&self, value: f64) -> &Color {
        let index = self.thresholds.partition_point(|t| *t <= value);
        &self.palette[index]
    }

    /// `["step", ["get", attribute], c0, t0, c1, ..., cN]` for the map
    /// engine's paint properties. With no thresholds the single color is
    /// returned as a literal, since a step needs at least one stop.
    pub fn step_expression(&self, attribute: &str) -> JsonValue {
        if self.thresholds.is_empty() {
            return json!(self.palette[0]);
        }
        let mut expression = vec![json!("step"), json!(["get", attribute]), json!(self.palette[0])];
        for (threshold, color) in self.thresholds.iter().zip(&self.palette[1..]) {
            expression.push(json!(threshold));
            expression.push(json!(color));
        }
        JsonValue::Array(expression)
    }
}

/// Splits `[min(values), max(values)]` into `palette.len()` equal-width bins.
///
/// Fails with `InvalidConfiguration` for an empty value set or a palette of
/// fewer than two colors. Non-finite values are ignored.
pub fn compute_bins(values: &[f64], palette: &[Color]) -> VizResult<ColorRamp> {
    if palette.len() < 2 {
        return Err(VizError::InvalidConfiguration(format!(
            "choropleth palette needs at least 2 colors, got {}",
            palette.len()
        )));
    }
    if values.is_empty() {
        return Err(VizError::InvalidConfiguration(
            "choropleth needs at least one value".to_string(),
        ));
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < values.len() {
        tracing::warn!("Ignoring {} non-finite values", values.len() - finite.len());
    }
    if finite.is_empty() {
        return Err(VizError::InvalidConfiguration(
            "choropleth values are all non-finite".to_string(),
        ));
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let palette = palette.to_vec();

    if min == max {
        let bins = vec![ColorBin {
            lower: min,
            upper: None,
            color: palette[0].clone(),
            label: format_bound(min),
        }];
        return Ok(ColorRamp {
            min,
            max,
            thresholds: Vec::new(),
            palette,
            bins,
        });
    }

    let bin_count = palette.len() as f64;
    let span = max - min;
    // a span wider than f64::MAX overflows; divide before subtracting then
    let threshold = |step: f64| {
        if span.is_finite() {
            min + (step * span) / bin_count
        } else {
            min + step * (max / bin_count - min / bin_count)
        }
    };
    let thresholds: Vec<f64> = (1..palette.len()).map(|i| threshold(i as f64)).collect();

    let bins = palette
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let lower = if i == 0 { min } else { thresholds[i - 1] };
            let upper = thresholds.get(i).copied();
            let label = match upper {
                Some(upper) => format!("{}–{}", format_bound(lower), format_bound(upper)),
                None => format!("{}+", format_bound(lower)),
            };
            ColorBin {
                lower,
                upper,
                color: color.clone(),
                label,
            }
        })
        .collect();

    tracing::debug!("Binned {} values over [{}, {}]", finite.len(), min, max);

    Ok(ColorRamp {
        min,
        max,
        thresholds,
        palette,
        bins,
    })
}

/// Bins one numeric attribute across every feature of a collection.
pub fn bins_for_attribute(
    collection: &FeatureCollection,
    attribute: &NumericAttribute,
    palette: &[Color],
) -> VizResult<ColorRamp> {
    compute_bins(&attribute.values(collection), palette)
}

// Legend numbers: nearest integer, halves away from zero
fn format_bound(value: f64) -> String {
    let rounded = value.round();
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{:.0}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tens() -> Vec<f64> {
        (0..=10).map(|i| (i * 10) as f64).collect()
    }

    #[test]
    fn equal_width_thresholds() {
        let ramp = compute_bins(&tens(), &palette(&PURPLES)).unwrap();
        assert_eq!(
            ramp.thresholds(),
            &[12.5, 25.0, 37.5, 50.0, 62.5, 75.0, 87.5]
        );
        assert_eq!(ramp.bins().len(), 8);
    }

    #[test]
    fn step_is_left_closed() {
        let colors = palette(&PURPLES);
        let ramp = compute_bins(&tens(), &colors).unwrap();
        assert_eq!(ramp.color_for_value(12.5), &colors[1]);
        assert_eq!(ramp.color_for_value(12.49), &colors[0]);
        assert_eq!(ramp.color_for_value(-5.0), &colors[0]);
        assert_eq!(ramp.color_for_value(87.5), &colors[7]);
        assert_eq!(ramp.color_for_value(1000.0), &colors[7]);
    }

    #[test]
    fn labels_round_to_integers() {
        let ramp = compute_bins(&tens(), &palette(&PURPLES)).unwrap();
        let labels: Vec<&str> = ramp.bins().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["0–13", "13–25", "25–38", "38–50", "50–63", "63–75", "75–88", "88+"]
        );
    }

    #[test]
    fn bins_are_contiguous() {
        let ramp = compute_bins(&[3.0, 41.0, 17.0], &palette(&PURPLES[..4])).unwrap();
        let bins = ramp.bins();
        assert_eq!(bins[0].lower, 3.0);
        for pair in bins.windows(2) {
            assert_eq!(pair[0].upper, Some(pair[1].lower));
        }
        assert_eq!(bins.last().unwrap().upper, None);
    }

    #[test]
    fn identical_values_share_first_color() {
        let colors = palette(&PURPLES);
        let ramp = compute_bins(&[5.0, 5.0, 5.0], &colors).unwrap();
        assert!(ramp.thresholds().is_empty());
        assert_eq!(ramp.bins().len(), 1);
        assert_eq!(ramp.color_for_value(5.0), &colors[0]);
        assert_eq!(ramp.step_expression("TOWERS"), json!("#f2f0f7"));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        assert!(matches!(
            compute_bins(&[], &palette(&PURPLES)),
            Err(VizError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            compute_bins(&[1.0, 2.0], &palette(&["#000000"])),
            Err(VizError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            compute_bins(&[f64::NAN], &palette(&PURPLES)),
            Err(VizError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn order_does_not_matter() {
        let colors = palette(&PURPLES);
        let mut shuffled = tens();
        shuffled.reverse();
        shuffled.swap(2, 7);
        assert_eq!(
            compute_bins(&tens(), &colors).unwrap(),
            compute_bins(&shuffled, &colors).unwrap()
        );
    }

    #[test]
    fn extreme_range_stays_finite() {
        let colors = palette(&PURPLES);
        let ramp = compute_bins(&[-1e308, 0.0, 1e308], &colors).unwrap();
        assert!(ramp.thresholds().iter().all(|t| t.is_finite()));
        assert!(ramp.thresholds().windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(ramp.color_for_value(1e308), &colors[7]);
        assert_eq!(ramp.color_for_value(-1e308), &colors[0]);
        assert!(ramp.bins().iter().all(|bin| !bin.label.contains("inf")));
    }

    #[test]
    fn step_expression_interleaves_stops() {
        let ramp = compute_bins(&[0.0, 30.0], &palette(&["#111111", "#222222", "#333333"])).unwrap();
        assert_eq!(
            ramp.step_expression("TOWERS"),
            json!(["step", ["get", "TOWERS"], "#111111", 10.0, "#222222", 20.0, "#333333"])
        );
    }
}
