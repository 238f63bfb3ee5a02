use wasm_bindgen::prelude::*;

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod view;

pub use config::AppConfig;
pub use engine::{ColorBin, ColorRamp, FitOptions, compute_bins, fit};
pub use error::VizError;
pub use model::{Color, GeoBounds, PixelSize, Viewport, VizResult};
pub use view::view::{MapView, ViewState};

#[wasm_bindgen(start)]
fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // a host may already have installed a subscriber
    let _ = tracing_subscriber::fmt::try_init();

    tracing::info!("tartu-viz initialized");
}
