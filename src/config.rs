use crate::engine::choropleth::{PURPLES, palette};
use crate::model::{Color, GeoBounds};
use crate::view::view::ViewState;

/// Runtime environment variable holding the map engine access token.
pub const TOKEN_ENV: &str = "MAPBOX_TOKEN";

// Baked in by the front-end build when present
const BUILD_TOKEN: Option<&str> = option_env!("VITE_MAPBOX_TOKEN");

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Access token for the external map engine; read once at start.
    pub access_token: Option<String>,
    pub districts_url: String,
    pub cell_towers_url: String,
    pub wms_base_url: String,
    pub default_view: ViewState,
    /// Panning limit of the advanced view.
    pub max_bounds: GeoBounds,
    pub fit_padding: f64,
    pub palette: Vec<Color>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            access_token: None,
            districts_url: "/tartu_city_districts_edu.geojson".to_string(),
            cell_towers_url: "/tartu_city_celltowers_edu.geojson".to_string(),
            wms_base_url: "https://landscape-geoinformatics.ut.ee/geoserver/pa2023/wms".to_string(),
            default_view: ViewState::default(),
            max_bounds: GeoBounds::new(26.5, 58.2, 27.0, 58.5),
            fit_padding: 20.0,
            palette: palette(&PURPLES),
        }
    }
}

impl AppConfig {
    /// Defaults plus the access token, preferring the runtime variable over
    /// the one captured at build time.
    pub fn from_env() -> Self {
        let access_token = std::env::var(TOKEN_ENV)
            .ok()
            .or_else(|| BUILD_TOKEN.map(str::to_string))
            .filter(|token| !token.trim().is_empty());
        if access_token.is_none() {
            tracing::warn!("No map access token set; base map tiles will not load");
        }
        AppConfig {
            access_token,
            ..AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_tartu() {
        let config = AppConfig::default();
        assert!(config.max_bounds.contains(26.76, 58.35));
        assert_eq!(config.palette.len(), 8);
        assert_eq!(config.fit_padding, 20.0);
        assert!(config.access_token.is_none());
    }
}
