pub mod analysis;
pub mod choropleth;
pub mod geometry;
pub mod transforms;

pub use choropleth::{ColorBin, ColorRamp, compute_bins};
pub use transforms::{FitOptions, collect_bounds, fit, fit_bounds, fit_with};
