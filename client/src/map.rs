use std::collections::BTreeMap;

use serde_json::Value;
use shared::{Coordinate, ShadeLayerDescriptor};

use crate::endpoints::Role;

/// Opaque id of an endpoint marker drawn by a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub u32);

/// Opaque id of an overlay (shade raster or route line) drawn by a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayHandle(pub u32);

/// User-facing messages raised by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    EndpointOutOfBounds,
    CatalogUnavailable,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::EndpointOutOfBounds => {
                "One or more endpoint is outside the Parasol domain. Please try again."
            }
            Notice::CatalogUnavailable => "Shade layers are unavailable right now.",
        }
    }
}

/// Drawing seam between the stores and the map library.
///
/// Every handle returned here is owned by exactly one store, which is the
/// only caller allowed to remove it. Implementations never mutate a drawn
/// layer in place except for overlay visibility.
pub trait MapSurface {
    fn add_marker(&mut self, role: Role, at: Coordinate) -> MarkerHandle;
    fn remove_marker(&mut self, marker: MarkerHandle);
    fn add_shade_overlay(&mut self, layer: &ShadeLayerDescriptor, visible: bool) -> OverlayHandle;
    fn set_overlay_visible(&mut self, overlay: OverlayHandle, visible: bool);
    fn add_route_overlay(&mut self, geometry: &Value) -> OverlayHandle;
    fn remove_overlay(&mut self, overlay: OverlayHandle);
    fn notify(&mut self, notice: Notice);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawnOverlay {
    Shade {
        layer: ShadeLayerDescriptor,
        visible: bool,
    },
    Route {
        geometry: Value,
    },
}

/// A [`MapSurface`] that keeps what is drawn in memory. Used headless by the
/// command-line client and as the observation point in tests.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    next_id: u32,
    markers: BTreeMap<MarkerHandle, (Role, Coordinate)>,
    overlays: BTreeMap<OverlayHandle, DrawnOverlay>,
    notices: Vec<Notice>,
}

impl InMemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerHandle, Role, Coordinate)> + '_ {
        self.markers
            .iter()
            .map(|(handle, (role, coord))| (*handle, *role, *coord))
    }

    pub fn marker_count(&self, role: Role) -> usize {
        self.markers.values().filter(|(r, _)| *r == role).count()
    }

    pub fn route_overlays(&self) -> Vec<&Value> {
        self.overlays
            .values()
            .filter_map(|overlay| match overlay {
                DrawnOverlay::Route { geometry } => Some(geometry),
                DrawnOverlay::Shade { .. } => None,
            })
            .collect()
    }

    pub fn shade_overlays(&self) -> Vec<(&ShadeLayerDescriptor, bool)> {
        self.overlays
            .values()
            .filter_map(|overlay| match overlay {
                DrawnOverlay::Shade { layer, visible } => Some((layer, *visible)),
                DrawnOverlay::Route { .. } => None,
            })
            .collect()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

impl MapSurface for InMemorySurface {
    fn add_marker(&mut self, role: Role, at: Coordinate) -> MarkerHandle {
        let handle = MarkerHandle(self.allocate());
        tracing::trace!(?handle, ?role, lat = at.lat, lon = at.lon, "marker added");
        self.markers.insert(handle, (role, at));
        handle
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        if self.markers.remove(&marker).is_none() {
            tracing::warn!(?marker, "removing unknown marker");
        }
    }

    fn add_shade_overlay(&mut self, layer: &ShadeLayerDescriptor, visible: bool) -> OverlayHandle {
        let handle = OverlayHandle(self.allocate());
        self.overlays.insert(
            handle,
            DrawnOverlay::Shade {
                layer: layer.clone(),
                visible,
            },
        );
        handle
    }

    fn set_overlay_visible(&mut self, overlay: OverlayHandle, visible: bool) {
        if let Some(DrawnOverlay::Shade { visible: current, .. }) = self.overlays.get_mut(&overlay) {
            *current = visible;
        }
    }

    fn add_route_overlay(&mut self, geometry: &Value) -> OverlayHandle {
        let handle = OverlayHandle(self.allocate());
        self.overlays.insert(
            handle,
            DrawnOverlay::Route {
                geometry: geometry.clone(),
            },
        );
        handle
    }

    fn remove_overlay(&mut self, overlay: OverlayHandle) {
        if self.overlays.remove(&overlay).is_none() {
            tracing::warn!(?overlay, "removing unknown overlay");
        }
    }

    fn notify(&mut self, notice: Notice) {
        tracing::info!("notice: {}", notice.message());
        self.notices.push(notice);
    }
}
