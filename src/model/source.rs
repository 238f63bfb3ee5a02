use crate::error::VizError;
use crate::model::VizResult;
use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::Value as JsonValue;

// Data source enumeration
#[derive(Clone, Debug)]
pub enum DataSource {
    Local(std::path::PathBuf),
    Http(String),
    Memory(Vec<u8>),
}

impl DataSource {
    pub fn from_path(path: &str) -> Self {
        if path.starts_with("http://") || path.starts_with("https://") {
            DataSource::Http(path.to_string())
        } else {
            DataSource::Local(std::path::PathBuf::from(path))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, DataSource::Http(_))
    }

    pub fn as_string(&self) -> String {
        match self {
            DataSource::Local(path) => path.to_string_lossy().to_string(),
            DataSource::Http(url) => url.clone(),
            DataSource::Memory(_) => "<memory>".to_string(),
        }
    }
}

/// A static GeoJSON asset (districts, cell towers).
#[derive(Clone, Debug)]
pub struct GeoJsonSource {
    pub source: DataSource,
    pub feature_count: Option<usize>,
}

impl GeoJsonSource {
    pub fn new(path: &str) -> Self {
        GeoJsonSource {
            source: DataSource::from_path(path),
            feature_count: None,
        }
    }

    pub fn from_memory(bytes: Vec<u8>) -> Self {
        GeoJsonSource {
            source: DataSource::Memory(bytes),
            feature_count: None,
        }
    }

    pub async fn load(&mut self) -> VizResult<FeatureCollection> {
        tracing::info!("Loading GeoJSON from {}", self.source.as_string());
        let content = self.fetch_text().await?;
        let collection = parse_feature_collection(&content)?;
        self.feature_count = Some(collection.features.len());
        tracing::info!(
            "Loaded {} features from {}",
            collection.features.len(),
            self.source.as_string()
        );
        Ok(collection)
    }

    async fn fetch_text(&self) -> VizResult<String> {
        match &self.source {
            DataSource::Http(url) => {
                let resp = reqwest::get(url)
                    .await
                    .map_err(|e| VizError::Io(format!("Failed to fetch URL: {}", e)))?
                    .error_for_status()
                    .map_err(|e| VizError::Io(format!("Bad response from {}: {}", url, e)))?;
                resp.text()
                    .await
                    .map_err(|e| VizError::Io(format!("Failed to read response: {}", e)))
            }
            DataSource::Local(path) => std::fs::read_to_string(path).map_err(|e| {
                VizError::Io(format!("Failed to read file {}: {}", path.display(), e))
            }),
            DataSource::Memory(bytes) => String::from_utf8(bytes.clone())
                .map_err(|e| VizError::Serialization(format!("Invalid UTF-8: {}", e))),
        }
    }
}

/// Parses a GeoJSON document into a feature collection.
///
/// A bare Feature or Geometry is wrapped into a one-element collection.
/// Features that fail to parse are dropped with a warning so one bad record
/// does not discard the whole dataset.
pub fn parse_feature_collection(content: &str) -> VizResult<FeatureCollection> {
    let value: JsonValue = serde_json::from_str(content)
        .map_err(|e| VizError::Serialization(format!("Invalid GeoJSON: {}", e)))?;

    match value.get("type").and_then(JsonValue::as_str) {
        Some("FeatureCollection") => {
            let bbox = value
                .get("bbox")
                .and_then(|b| serde_json::from_value::<Vec<f64>>(b.clone()).ok());
            let raw = value
                .get("features")
                .and_then(JsonValue::as_array)
                .ok_or_else(|| {
                    VizError::Serialization("FeatureCollection without features".to_string())
                })?;

            let features = raw
                .iter()
                .enumerate()
                .filter_map(|(index, raw_feature)| {
                    Feature::from_json_value(raw_feature.clone())
                        .map_err(|e| tracing::warn!("Skipping feature {}: {}", index, e))
                        .ok()
                })
                .collect();

            Ok(FeatureCollection {
                bbox,
                features,
                foreign_members: None,
            })
        }
        Some("Feature") => {
            let feature = Feature::from_json_value(value)
                .map_err(|e| VizError::Serialization(format!("Invalid feature: {}", e)))?;
            Ok(single_feature_collection(feature))
        }
        Some(_) => {
            let geometry = Geometry::from_json_value(value)
                .map_err(|e| VizError::Serialization(format!("Invalid geometry: {}", e)))?;
            Ok(single_feature_collection(Feature::from(geometry)))
        }
        None => Err(VizError::Serialization(
            "GeoJSON object has no type".to_string(),
        )),
    }
}

fn single_feature_collection(feature: Feature) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }
}

/// Load state of a dataset backing a view.
///
/// A failed first load is logged and leaves the view in `Loading`, which
/// keeps its placeholder on screen. A failed reload keeps the data already
/// loaded.
#[derive(Clone, Debug, Default)]
pub enum DatasetState {
    #[default]
    Loading,
    Loaded(FeatureCollection),
}

impl DatasetState {
    pub fn resolve(name: &str, result: VizResult<FeatureCollection>) -> Self {
        match result {
            Ok(collection) => DatasetState::Loaded(collection),
            Err(e) => {
                tracing::error!("Failed to load {}: {}", name, e);
                DatasetState::Loading
            }
        }
    }

    /// Applies a reload result on top of the current state.
    pub fn update(&mut self, name: &str, result: VizResult<FeatureCollection>) {
        match result {
            Ok(collection) => *self = DatasetState::Loaded(collection),
            Err(e) if self.is_loaded() => {
                tracing::warn!("Reloading {} failed, keeping previous data: {}", name, e);
            }
            Err(e) => *self = DatasetState::resolve(name, Err(e)),
        }
    }

    pub fn collection(&self) -> Option<&FeatureCollection> {
        match self {
            DatasetState::Loaded(collection) => Some(collection),
            DatasetState::Loading => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, DatasetState::Loaded(_))
    }
}
