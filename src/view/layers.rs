//! Declarative layer configuration handed to the external map engine.
//!
//! Nothing here draws; each layer is a plain struct that serializes to the
//! engine's `{ id, type, source, paint, layout }` shape.

use crate::engine::choropleth::ColorRamp;
use crate::engine::geometry;
use crate::error::VizError;
use crate::model::VizResult;
use crate::model::properties::{NumericAttribute, TextAttribute};
use geojson::FeatureCollection;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;

pub type LayerId = String;

pub const WMS_ATTRIBUTION: &str = "© Estonian Rescue Board";
/// Raster overlays are drawn at this fraction of their nominal opacity so
/// the base map stays readable underneath.
pub const RASTER_OPACITY_SCALE: f32 = 0.7;
pub const WMS_TILE_SIZE: u32 = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Raster,
    Fill,
    Line,
    Circle,
    Heatmap,
}

// Layer management
#[derive(Clone, Debug, PartialEq)]
pub struct LayerConfig {
    pub id: LayerId,
    pub kind: LayerKind,
    pub source: JsonValue,
    pub paint: JsonValue,
    pub visible: bool,
    pub z_index: i32,
    pub opacity: f32,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl LayerConfig {
    pub fn new(id: &str, kind: LayerKind, source: JsonValue) -> Self {
        LayerConfig {
            id: id.to_string(),
            kind,
            source,
            paint: json!({}),
            visible: true,
            z_index: 0,
            opacity: 1.0,
            min_zoom: 0,
            max_zoom: 20,
        }
    }

    pub fn is_valid(&self) -> VizResult<()> {
        if self.id.is_empty() {
            return Err(VizError::InvalidConfiguration(
                "Layer ID cannot be empty".to_string(),
            ));
        }
        if self.opacity < 0.0 || self.opacity > 1.0 {
            return Err(VizError::InvalidConfiguration(
                "Layer opacity must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.min_zoom > self.max_zoom {
            return Err(VizError::InvalidConfiguration(
                "min_zoom cannot be greater than max_zoom".to_string(),
            ));
        }
        if self.max_zoom > 20 {
            return Err(VizError::InvalidConfiguration(
                "max_zoom cannot exceed 20".to_string(),
            ));
        }
        if !self.paint.is_object() {
            return Err(VizError::InvalidConfiguration(format!(
                "Layer {} paint must be an object",
                self.id
            )));
        }
        Ok(())
    }

    pub fn is_visible_at_zoom(&self, zoom: f64) -> bool {
        self.visible && zoom >= self.min_zoom as f64 && zoom <= self.max_zoom as f64
    }

    pub fn with_paint(mut self, paint: JsonValue) -> Self {
        self.paint = paint;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom.min(20);
        self.max_zoom = max_zoom.min(20);
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn layout(&self) -> JsonValue {
        json!({ "visibility": if self.visible { "visible" } else { "none" } })
    }

    /// Paint with the layer opacity folded into the kind's opacity property.
    pub fn paint(&self) -> JsonValue {
        let mut paint = self.paint.clone();
        let key = match self.kind {
            LayerKind::Raster => "raster-opacity",
            LayerKind::Fill => "fill-opacity",
            LayerKind::Line => "line-opacity",
            LayerKind::Circle => "circle-opacity",
            LayerKind::Heatmap => "heatmap-opacity",
        };
        if let Some(object) = paint.as_object_mut() {
            let base = object.get(key).and_then(JsonValue::as_f64).unwrap_or(1.0);
            object.insert(key.to_string(), json!(base * self.opacity as f64));
        }
        paint
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "id": self.id,
            "type": self.kind,
            "source": self.source,
            "paint": self.paint(),
            "layout": self.layout(),
            "minzoom": self.min_zoom,
            "maxzoom": self.max_zoom,
        })
    }
}

/// Renders the layers bottom to top.
pub fn render_order(layers: &[LayerConfig]) -> Vec<JsonValue> {
    let mut sorted: Vec<&LayerConfig> = layers.iter().collect();
    sorted.sort_by_key(|layer| layer.z_index);
    sorted.into_iter().map(LayerConfig::to_json).collect()
}

// WMS raster overlays

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WmsOverlay {
    pub id: &'static str,
    pub layer_name: &'static str,
    pub opacity: f32,
    pub z_index: i32,
}

pub const WMS_OVERLAYS: [WmsOverlay; 3] = [
    WmsOverlay {
        id: "ten_minute_areas",
        layer_name: "rpk_10min_ala_db",
        opacity: 0.8,
        z_index: 1,
    },
    WmsOverlay {
        id: "five_minute_areas",
        layer_name: "rpk_5min_ala_db",
        opacity: 0.8,
        z_index: 2,
    },
    WmsOverlay {
        id: "rescue_commands",
        layer_name: "komandod_prognoosimudelile_db",
        opacity: 1.0,
        z_index: 3,
    },
];

/// WMS 1.1.1 GetMap template; the engine substitutes `{bbox-epsg-3857}`
/// for each tile.
pub fn wms_tile_url(base_url: &str, layer_name: &str) -> String {
    format!(
        "{base_url}?SERVICE=WMS&VERSION=1.1.1&REQUEST=GetMap&LAYERS={layer_name}\
         &STYLES=&FORMAT=image/png&TRANSPARENT=TRUE&SRS=EPSG:3857&BBOX={{bbox-epsg-3857}}\
         &WIDTH={WMS_TILE_SIZE}&HEIGHT={WMS_TILE_SIZE}&TILED=true"
    )
}

pub fn wms_layer(base_url: &str, overlay: &WmsOverlay) -> LayerConfig {
    let source = json!({
        "type": "raster",
        "tiles": [wms_tile_url(base_url, overlay.layer_name)],
        "tileSize": WMS_TILE_SIZE,
        "attribution": WMS_ATTRIBUTION,
    });
    LayerConfig::new(overlay.id, LayerKind::Raster, source)
        .with_paint(json!({ "raster-opacity": overlay.opacity }))
        .with_opacity(RASTER_OPACITY_SCALE)
        .with_z_index(overlay.z_index)
}

// Visibility toggles

pub const BASIC_LAYER_IDS: [&str; 2] = ["districts", "cell_towers"];

pub const ADVANCED_LAYER_IDS: [&str; 8] = [
    "rescue_commands",
    "five_minute_areas",
    "ten_minute_areas",
    "cell_towers",
    "convex_hull",
    "selected_points",
    "nearest_point",
    "selection_line",
];

#[derive(Clone, Debug, PartialEq)]
pub struct LayerVisibility {
    layers: BTreeMap<LayerId, bool>,
}

impl Default for LayerVisibility {
    fn default() -> Self {
        LayerVisibility::with_layers(&ADVANCED_LAYER_IDS)
    }
}

impl LayerVisibility {
    /// Every listed layer starts visible.
    pub fn with_layers(ids: &[&str]) -> Self {
        LayerVisibility {
            layers: ids.iter().map(|id| (id.to_string(), true)).collect(),
        }
    }

    pub fn basic() -> Self {
        LayerVisibility::with_layers(&BASIC_LAYER_IDS)
    }

    /// Unknown layers are treated as hidden.
    pub fn is_visible(&self, id: &str) -> bool {
        self.layers.get(id).copied().unwrap_or(false)
    }

    /// Flips a known layer and returns its new state.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let visible = self.layers.get_mut(id)?;
        *visible = !*visible;
        Some(*visible)
    }

    /// Sets a known layer; returns `false` for an unknown id.
    pub fn set(&mut self, id: &str, visible: bool) -> bool {
        match self.layers.get_mut(id) {
            Some(state) => {
                *state = visible;
                true
            }
            None => false,
        }
    }
}

pub fn geojson_source(id: &str) -> JsonValue {
    json!({ "type": "geojson", "id": id })
}

pub fn circle_layer(id: &str, source_id: &str, radius: f64, color: &str) -> LayerConfig {
    LayerConfig::new(id, LayerKind::Circle, geojson_source(source_id))
        .with_paint(json!({
            "circle-radius": radius,
            "circle-color": color,
            "circle-opacity": 1.0,
        }))
        .with_opacity(0.7)
}

/// Every layer of the advanced view, bottom to top, with visibility applied.
pub fn advanced_layers(wms_base_url: &str, visibility: &LayerVisibility) -> Vec<LayerConfig> {
    let mut layers: Vec<LayerConfig> = WMS_OVERLAYS
        .iter()
        .map(|overlay| wms_layer(wms_base_url, overlay))
        .collect();

    layers.push(circle_layer("cell_towers", "cellTowers", 4.0, "#ff0000").with_z_index(10));
    layers.push(
        LayerConfig::new("convex_hull", LayerKind::Fill, geojson_source("convexHull"))
            .with_paint(json!({ "fill-color": "#00ff00", "fill-opacity": 0.15 }))
            .with_z_index(11),
    );
    layers.push(
        LayerConfig::new("selection_line", LayerKind::Line, geojson_source("selectionLine"))
            .with_paint(json!({ "line-color": "#0000ff", "line-width": 2 }))
            .with_opacity(0.7)
            .with_z_index(12),
    );
    layers.push(circle_layer("selected_points", "selectedPoints", 6.0, "#0000ff").with_z_index(13));
    layers.push(circle_layer("nearest_point", "nearestPoint", 8.0, "#ffff00").with_z_index(14));

    layers
        .into_iter()
        .map(|layer| {
            let visible = visibility.is_visible(&layer.id);
            layer.with_visibility(visible)
        })
        .collect()
}

// Basic overlay view: district polygons under tower points

pub const DISTRICT_FILL: &str = "rgba(255, 0, 0, 0.39)";
pub const DISTRICT_LINE: &str = "rgb(200, 0, 0)";
pub const TOWER_FILL: &str = "rgb(0, 128, 255)";

pub fn basic_layers(visibility: &LayerVisibility) -> Vec<LayerConfig> {
    let layers = vec![
        LayerConfig::new("districts", LayerKind::Fill, geojson_source("districts"))
            .with_paint(json!({
                "fill-color": DISTRICT_FILL,
                "fill-outline-color": DISTRICT_LINE,
            })),
        LayerConfig::new("cell_towers", LayerKind::Circle, geojson_source("cellTowers"))
            .with_paint(json!({
                "circle-radius": 5,
                "circle-color": TOWER_FILL,
            }))
            .with_z_index(1),
    ];
    layers
        .into_iter()
        .map(|layer| {
            let visible = visibility.is_visible(&layer.id);
            layer.with_visibility(visible)
        })
        .collect()
}

/// Hover text of a district in the basic view.
pub fn district_tooltip(feature: &geojson::Feature) -> String {
    format!("District: {}", TextAttribute::new("name", "").get(feature))
}

// Choropleth

pub fn choropleth_layers(ramp: &ColorRamp, attribute: &str) -> Vec<LayerConfig> {
    vec![
        LayerConfig::new("district-fill", LayerKind::Fill, geojson_source("districts"))
            .with_paint(json!({
                "fill-color": ramp.step_expression(attribute),
                "fill-opacity": 0.7,
            })),
        LayerConfig::new("district-outline", LayerKind::Line, geojson_source("districts"))
            .with_paint(json!({ "line-color": "#444", "line-width": 1 }))
            .with_z_index(1),
    ]
}

// Heatmap

/// Cells average the weights of the towers they cover.
pub const HEATMAP_AGGREGATION: &str = "MEAN";

#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapConfig {
    pub weight: NumericAttribute,
    pub intensity: f64,
    pub threshold: f64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        HeatmapConfig {
            weight: NumericAttribute::area(),
            intensity: 1.0,
            threshold: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WeightedPoint {
    pub position: [f64; 2],
    pub weight: f64,
}

impl HeatmapConfig {
    /// Point features with their weight; other geometries are ignored.
    pub fn points(&self, collection: &FeatureCollection) -> Vec<WeightedPoint> {
        geometry::point_features(collection)
            .into_iter()
            .map(|(feature, (x, y))| WeightedPoint {
                position: [x, y],
                weight: self.weight.get(feature),
            })
            .collect()
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "id": "heatmap",
            "intensity": self.intensity,
            "threshold": self.threshold,
            "aggregation": HEATMAP_AGGREGATION,
            "weightProperty": self.weight.key,
        })
    }
}

// Scatter points of the basic view

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TowerPoint {
    pub position: [f64; 2],
    pub name: String,
}

pub fn tower_points(collection: &FeatureCollection) -> Vec<TowerPoint> {
    let name = TextAttribute::tower_name();
    geometry::point_features(collection)
        .into_iter()
        .map(|(feature, (x, y))| TowerPoint {
            position: [x, y],
            name: name.get(feature),
        })
        .collect()
}
