use crate::config::AppConfig;
use crate::engine::analysis::{self, NearestPoint};
use crate::engine::choropleth::{self, ColorRamp};
use crate::engine::transforms::{self, MAX_ZOOM, MIN_ZOOM};
use crate::error::VizError;
use crate::model::properties::{NumericAttribute, TextAttribute};
use crate::model::source::{DatasetState, parse_feature_collection};
use crate::model::{Color, GeoBounds, PixelSize, Viewport, VizResult};
use crate::view::layers::{self, HeatmapConfig, LayerVisibility};
use crate::view::selection::Selection;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use wasm_bindgen::prelude::*;

/// Camera state owned by the view. Fitting produces a new value that
/// replaces this one; nothing mutates it behind the view's back.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            longitude: 26.76,
            latitude: 58.35,
            zoom: 10.0,
            pitch: 0.0,
            bearing: 0.0,
        }
    }
}

impl ViewState {
    pub fn from_viewport(viewport: Viewport) -> Self {
        ViewState {
            longitude: viewport.longitude,
            latitude: viewport.latitude,
            zoom: viewport.zoom,
            pitch: 0.0,
            bearing: 0.0,
        }
    }
}

/// Popup content for a clicked district.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistrictSummary {
    pub name: String,
    pub towers: f64,
}

#[wasm_bindgen]
pub struct MapView {
    state: ViewState,
    default_view: ViewState,
    max_bounds: Option<GeoBounds>,
    padding: f64,
    palette: Vec<Color>,
    wms_base_url: String,
    districts: DatasetState,
    cell_towers: DatasetState,
    selection: Selection,
    visibility: LayerVisibility,
    basic_visibility: LayerVisibility,
    heatmap: HeatmapConfig,
}

impl Default for MapView {
    fn default() -> Self {
        MapView::from_config(&AppConfig::default())
    }
}

impl MapView {
    pub fn from_config(config: &AppConfig) -> Self {
        MapView {
            state: config.default_view,
            default_view: config.default_view,
            max_bounds: Some(config.max_bounds),
            padding: config.fit_padding,
            palette: config.palette.clone(),
            wms_base_url: config.wms_base_url.clone(),
            districts: DatasetState::Loading,
            cell_towers: DatasetState::Loading,
            selection: Selection::default(),
            visibility: LayerVisibility::default(),
            basic_visibility: LayerVisibility::basic(),
            heatmap: HeatmapConfig::default(),
        }
    }

    /// Lifts the panning limit, as in the overview maps.
    pub fn without_max_bounds(mut self) -> Self {
        self.max_bounds = None;
        self
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn set_districts(&mut self, districts: DatasetState) {
        self.districts = districts;
    }

    pub fn set_cell_towers(&mut self, cell_towers: DatasetState) {
        self.cell_towers = cell_towers;
    }

    pub fn districts(&self) -> Option<&geojson::FeatureCollection> {
        self.districts.collection()
    }

    pub fn cell_towers(&self) -> Option<&geojson::FeatureCollection> {
        self.cell_towers.collection()
    }

    /// True until both datasets have arrived.
    pub fn is_loading(&self) -> bool {
        !(self.districts.is_loaded() && self.cell_towers.is_loaded())
    }

    /// Frames every loaded dataset. Returns `false` and keeps the current
    /// view while nothing has loaded.
    pub fn refit(&mut self, size: PixelSize) -> bool {
        let fitted = transforms::fit(&[self.districts(), self.cell_towers()], size, self.padding);
        match fitted {
            Some(viewport) => {
                self.state = ViewState::from_viewport(viewport);
                tracing::info!(
                    "Map view fitted to ({:.4}, {:.4}) at zoom {:.2}",
                    viewport.longitude,
                    viewport.latitude,
                    viewport.zoom
                );
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.state = self.default_view;
    }

    pub fn set_center(&mut self, longitude: f64, latitude: f64) {
        let (longitude, latitude) = match &self.max_bounds {
            Some(bounds) => (
                longitude.clamp(bounds.min_x, bounds.max_x),
                latitude.clamp(bounds.min_y, bounds.max_y),
            ),
            None => (longitude, latitude),
        };
        self.state.longitude = longitude;
        self.state.latitude = latitude;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.state.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Tower-count ramp, or `None` while districts are loading.
    pub fn choropleth(&self) -> VizResult<Option<ColorRamp>> {
        self.districts()
            .map(|districts| {
                choropleth::bins_for_attribute(districts, &NumericAttribute::towers(), &self.palette)
            })
            .transpose()
    }

    pub fn district_summary(&self, feature_index: usize) -> Option<DistrictSummary> {
        let feature = self.districts()?.features.get(feature_index)?;
        Some(DistrictSummary {
            name: TextAttribute::district_name().get(feature),
            towers: NumericAttribute::towers().get(feature),
        })
    }

    pub fn click(&mut self, longitude: f64, latitude: f64) -> Option<NearestPoint> {
        self.selection
            .click(self.cell_towers.collection(), (longitude, latitude))
            .cloned()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle_layer(&mut self, id: &str) -> Option<bool> {
        self.visibility.toggle(id)
    }

    /// Shows or hides `districts` or `cell_towers` in the basic view.
    pub fn set_basic_layer(&mut self, id: &str, visible: bool) -> bool {
        self.basic_visibility.set(id, visible)
    }

    /// Ids of the advanced-view layers drawn at the current zoom.
    pub fn visible_layers(&self) -> Vec<String> {
        layers::advanced_layers(&self.wms_base_url, &self.visibility)
            .into_iter()
            .filter(|layer| layer.is_visible_at_zoom(self.state.zoom))
            .map(|layer| layer.id)
            .collect()
    }

    pub fn district_tooltip(&self, feature_index: usize) -> Option<String> {
        let feature = self.districts()?.features.get(feature_index)?;
        Some(layers::district_tooltip(feature))
    }

    /// District polygons and tower points, each behind its toggle.
    pub fn basic_scene(&self) -> JsonValue {
        let layers = layers::basic_layers(&self.basic_visibility);
        let points = self.cell_towers().map(layers::tower_points);
        serde_json::json!({
            "layers": layers::render_order(&layers),
            "sources": {
                "districts": self.districts(),
                "cellTowers": self.cell_towers(),
            },
            "points": points,
        })
    }

    /// Weighted tower points for the heatmap, or `None` while towers load.
    pub fn heatmap_scene(&self) -> Option<JsonValue> {
        let towers = self.cell_towers()?;
        Some(serde_json::json!({
            "layer": self.heatmap.to_json(),
            "points": self.heatmap.points(towers),
        }))
    }

    /// Advanced-view layer stack plus the GeoJSON sources its vector layers
    /// read from.
    pub fn advanced_scene(&self) -> JsonValue {
        let layers = layers::advanced_layers(&self.wms_base_url, &self.visibility);
        let hull = self.cell_towers().and_then(analysis::convex_hull);
        let nearest = self
            .selection
            .nearest()
            .map(|n| geojson::Geometry::new(geojson::Value::Point(vec![n.position.0, n.position.1])));
        serde_json::json!({
            "layers": layers::render_order(&layers),
            "sources": {
                "cellTowers": self.cell_towers(),
                "convexHull": hull,
                "selectedPoints": self.selection.points_collection(),
                "nearestPoint": nearest,
                "selectionLine": self.selection.line().map(|l| &l.geometry),
            }
        })
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&VizError::Wasm(e.to_string()).to_string()))
}

fn to_js_error(error: VizError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[wasm_bindgen]
impl MapView {
    #[wasm_bindgen(constructor)]
    pub fn new_wasm() -> MapView {
        MapView::from_config(&AppConfig::from_env())
    }

    /// Feeds a fetched districts document. A parse failure leaves the view
    /// loading, or keeps the districts already shown.
    #[wasm_bindgen]
    pub fn load_districts(&mut self, geojson: &str) -> Result<(), JsValue> {
        let result = parse_feature_collection(geojson);
        let error = result.as_ref().err().map(|e| e.to_string());
        self.districts.update("districts", result);
        error.map_or(Ok(()), |e| Err(JsValue::from_str(&e)))
    }

    #[wasm_bindgen]
    pub fn load_cell_towers(&mut self, geojson: &str) -> Result<(), JsValue> {
        let result = parse_feature_collection(geojson);
        let error = result.as_ref().err().map(|e| e.to_string());
        self.cell_towers.update("cell towers", result);
        error.map_or(Ok(()), |e| Err(JsValue::from_str(&e)))
    }

    #[wasm_bindgen]
    pub fn fit(&mut self, width: f64, height: f64) -> bool {
        self.refit(PixelSize::new(width, height))
    }

    /// Fits to the browser window's inner size.
    #[wasm_bindgen]
    pub fn fit_to_window(&mut self) -> Result<bool, JsValue> {
        let window = web_sys::window().ok_or_else(|| to_js_error(VizError::Wasm("No window".to_string())))?;
        let width = window.inner_width()?.as_f64().unwrap_or(0.0);
        let height = window.inner_height()?.as_f64().unwrap_or(0.0);
        Ok(self.refit(PixelSize::new(width, height)))
    }

    #[wasm_bindgen(getter)]
    pub fn longitude(&self) -> f64 {
        self.state.longitude
    }

    #[wasm_bindgen(getter)]
    pub fn latitude(&self) -> f64 {
        self.state.latitude
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    #[wasm_bindgen]
    pub fn view_state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state)
    }

    #[wasm_bindgen]
    pub fn move_to(&mut self, longitude: f64, latitude: f64, zoom: f64) {
        self.set_center(longitude, latitude);
        self.set_zoom(zoom);
    }

    #[wasm_bindgen]
    pub fn reset_view(&mut self) {
        self.reset();
    }

    /// `fill-color` step expression, or `null` while districts load.
    #[wasm_bindgen]
    pub fn choropleth_fill(&self) -> Result<JsValue, JsValue> {
        let ramp = self.choropleth().map_err(to_js_error)?;
        to_js(&ramp.map(|r| r.step_expression(&NumericAttribute::towers().key)))
    }

    #[wasm_bindgen]
    pub fn legend(&self) -> Result<JsValue, JsValue> {
        let ramp = self.choropleth().map_err(to_js_error)?;
        to_js(&ramp.map(|r| r.bins().to_vec()))
    }

    #[wasm_bindgen]
    pub fn district_popup(&self, feature_index: usize) -> Result<JsValue, JsValue> {
        to_js(&self.district_summary(feature_index))
    }

    /// Records a click and returns `[lng, lat]` of the nearest tower.
    #[wasm_bindgen]
    pub fn select_at(&mut self, longitude: f64, latitude: f64) -> Result<JsValue, JsValue> {
        let nearest = self.click(longitude, latitude);
        to_js(&nearest.map(|n| [n.position.0, n.position.1]))
    }

    #[wasm_bindgen]
    pub fn toggle_layer_wasm(&mut self, id: &str) -> bool {
        self.toggle_layer(id).unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn scene(&self) -> Result<JsValue, JsValue> {
        to_js(&self.advanced_scene())
    }

    #[wasm_bindgen(getter)]
    pub fn loading(&self) -> bool {
        self.is_loading()
    }

    #[wasm_bindgen]
    pub fn show_basic_layer(&mut self, id: &str, visible: bool) -> bool {
        self.set_basic_layer(id, visible)
    }

    #[wasm_bindgen]
    pub fn visible_layer_ids(&self) -> Result<JsValue, JsValue> {
        to_js(&self.visible_layers())
    }

    #[wasm_bindgen]
    pub fn tooltip_at(&self, feature_index: usize) -> Option<String> {
        self.district_tooltip(feature_index)
    }

    #[wasm_bindgen]
    pub fn basic_view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.basic_scene())
    }

    /// Heatmap layer settings and points, or `null` while towers load.
    #[wasm_bindgen]
    pub fn heatmap_view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.heatmap_scene())
    }
}
