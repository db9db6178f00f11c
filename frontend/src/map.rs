use client::{MapSurface, MarkerHandle, Notice, OverlayHandle, Role};
use serde::Serialize;
use serde_json::Value;
use shared::{Coordinate, ShadeLayerDescriptor};
use wasm_bindgen::prelude::{wasm_bindgen, JsValue};

#[wasm_bindgen(module = "/leaflet_map.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    pub fn init_map();
    #[wasm_bindgen(js_name = addMarker)]
    fn add_marker_js(role: &str, lat: f64, lon: f64) -> u32;
    #[wasm_bindgen(js_name = removeLayer)]
    fn remove_layer_js(id: u32);
    #[wasm_bindgen(js_name = addShadeLayer)]
    fn add_shade_layer_js(url: &str, params: JsValue, visible: bool) -> u32;
    #[wasm_bindgen(js_name = setLayerVisible)]
    fn set_layer_visible_js(id: u32, visible: bool);
    #[wasm_bindgen(js_name = addRouteLayer)]
    fn add_route_layer_js(geometry: JsValue) -> u32;
    #[wasm_bindgen(js_name = showNotice)]
    fn show_notice_js(message: &str);
}

/// [`MapSurface`] backed by the Leaflet map in `leaflet_map.js`. Layer ids
/// are allocated on the JS side.
#[derive(Debug, Default)]
pub struct LeafletSurface;

impl LeafletSurface {
    pub fn new() -> Self {
        Self
    }
}

// serde_wasm_bindgen turns JSON objects into JS `Map`s unless asked not to.
fn to_js(value: &Value) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

impl MapSurface for LeafletSurface {
    fn add_marker(&mut self, role: Role, at: Coordinate) -> MarkerHandle {
        MarkerHandle(add_marker_js(&role.to_string(), at.lat, at.lon))
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        remove_layer_js(marker.0);
    }

    fn add_shade_overlay(&mut self, layer: &ShadeLayerDescriptor, visible: bool) -> OverlayHandle {
        let params = to_js(&Value::Object(layer.parameters.clone()));
        OverlayHandle(add_shade_layer_js(&layer.url, params, visible))
    }

    fn set_overlay_visible(&mut self, overlay: OverlayHandle, visible: bool) {
        set_layer_visible_js(overlay.0, visible);
    }

    fn add_route_overlay(&mut self, geometry: &Value) -> OverlayHandle {
        OverlayHandle(add_route_layer_js(to_js(geometry)))
    }

    fn remove_overlay(&mut self, overlay: OverlayHandle) {
        remove_layer_js(overlay.0);
    }

    fn notify(&mut self, notice: Notice) {
        web_sys::console::warn_1(&format!("[frontend] notice {notice:?}").into());
        show_notice_js(notice.message());
    }
}
