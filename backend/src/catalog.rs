use serde_json::{json, Map};

use crate::models::{ShadeLayerDescriptor, TimeOfDay};

/// Where shade rasters are served from and which times exist.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCatalogConfig {
    /// WMS endpoint of the tile server.
    pub tile_url: String,
    pub workspace: String,
    pub layer_prefix: String,
    pub opacity: f64,
    /// First layer time, in hours (inclusive).
    pub start_hour: u8,
    /// Last layer time, in hours (exclusive).
    pub stop_hour: u8,
    pub step_minutes: u16,
}

impl Default for LayerCatalogConfig {
    fn default() -> Self {
        Self {
            tile_url: "http://localhost:8080/geoserver/ows".to_string(),
            workspace: "parasol".to_string(),
            layer_prefix: "shade_top_".to_string(),
            opacity: 0.7,
            start_hour: 6,
            stop_hour: 21,
            step_minutes: 30,
        }
    }
}

/// Layer times from `start_hour` up to, not including, `stop_hour`.
pub fn layer_times(config: &LayerCatalogConfig) -> Vec<TimeOfDay> {
    let start = u32::from(config.start_hour) * 60;
    let stop = u32::from(config.stop_hour.min(24)) * 60;
    let step = u32::from(config.step_minutes.max(1));
    (start..stop)
        .step_by(step as usize)
        .filter_map(|minutes| TimeOfDay::new((minutes / 60) as u8, (minutes % 60) as u8))
        .collect()
}

pub fn build_catalog(config: &LayerCatalogConfig) -> Vec<ShadeLayerDescriptor> {
    layer_times(config)
        .into_iter()
        .map(|time| {
            let mut parameters = Map::new();
            parameters.insert(
                "layers".into(),
                json!(format!(
                    "{}:{}{:02}{:02}",
                    config.workspace, config.layer_prefix, time.hour, time.minute
                )),
            );
            parameters.insert("opacity".into(), json!(config.opacity));
            parameters.insert("transparent".into(), json!(true));
            parameters.insert("format".into(), json!("image/png"));
            ShadeLayerDescriptor {
                hour: time.hour,
                minute: time.minute,
                url: config.tile_url.clone(),
                parameters,
            }
        })
        .collect()
}
