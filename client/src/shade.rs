use shared::{ShadeLayerDescriptor, TimeOfDay};

use crate::error::ClientError;
use crate::map::{MapSurface, OverlayHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Index of the catalog entry nearest to `now`, comparing minutes since
/// midnight. The first entry with the smallest difference wins ties.
pub fn nearest_index(layers: &[ShadeLayerDescriptor], now: TimeOfDay) -> Option<usize> {
    let now = now.minutes_since_midnight();
    let mut best: Option<(usize, u32)> = None;
    for (idx, layer) in layers.iter().enumerate() {
        let diff = layer.time().minutes_since_midnight().abs_diff(now);
        if best.map_or(true, |(_, best_diff)| diff < best_diff) {
            best = Some((idx, diff));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Owns the time-indexed shade catalog and the single shade overlay drawn
/// from it.
#[derive(Debug)]
pub struct ShadeLayerManager {
    state: CatalogState,
    catalog: Vec<ShadeLayerDescriptor>,
    selected: Option<usize>,
    overlay: Option<OverlayHandle>,
    visible: bool,
}

impl ShadeLayerManager {
    pub fn new(visible: bool) -> Self {
        Self {
            state: CatalogState::NotLoaded,
            catalog: Vec::new(),
            selected: None,
            overlay: None,
            visible,
        }
    }

    pub fn state(&self) -> CatalogState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == CatalogState::Loaded
    }

    /// Marks a fetch as started. Returns `false` when the catalog is already
    /// loaded or a fetch is in flight, in which case no new fetch is needed.
    pub fn begin_load(&mut self) -> bool {
        match self.state {
            CatalogState::Loaded | CatalogState::Loading => false,
            CatalogState::NotLoaded | CatalogState::Failed => {
                self.state = CatalogState::Loading;
                true
            }
        }
    }

    /// Records a failed fetch. Nothing is drawn.
    pub fn fail_load(&mut self, reason: impl Into<String>) -> ClientError {
        let reason = reason.into();
        tracing::warn!("shade catalog unavailable: {reason}");
        self.state = CatalogState::Failed;
        ClientError::CatalogUnavailable(reason)
    }

    /// Installs a fetched catalog and draws the entry nearest to `now`.
    ///
    /// A second install after a successful one is ignored and returns the
    /// current selection.
    pub fn install_catalog(
        &mut self,
        surface: &mut impl MapSurface,
        mut layers: Vec<ShadeLayerDescriptor>,
        now: TimeOfDay,
    ) -> Result<usize, ClientError> {
        if self.is_loaded() {
            return self.selected.ok_or(ClientError::CatalogNotLoaded);
        }
        layers.sort_by_key(ShadeLayerDescriptor::time);
        let Some(index) = nearest_index(&layers, now) else {
            return Err(self.fail_load("catalog is empty"));
        };
        tracing::info!(
            layers = layers.len(),
            default = %layers[index].time(),
            "shade catalog loaded"
        );
        self.catalog = layers;
        self.state = CatalogState::Loaded;
        self.draw(surface, index);
        Ok(index)
    }

    pub fn catalog(&self) -> &[ShadeLayerDescriptor] {
        &self.catalog
    }

    /// `HH:MM` labels in catalog order, for the time selector.
    pub fn labels(&self) -> Vec<String> {
        self.catalog.iter().map(|layer| layer.time().to_string()).collect()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&ShadeLayerDescriptor> {
        self.catalog.get(self.selected?)
    }

    pub fn selected_time(&self) -> Option<TimeOfDay> {
        self.selected().map(ShadeLayerDescriptor::time)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Replaces the drawn overlay with catalog entry `index`, keeping the
    /// current visibility. Out-of-range indices leave everything untouched.
    pub fn select_index(
        &mut self,
        surface: &mut impl MapSurface,
        index: usize,
    ) -> Result<&ShadeLayerDescriptor, ClientError> {
        if !self.is_loaded() {
            return Err(ClientError::CatalogNotLoaded);
        }
        if index >= self.catalog.len() {
            return Err(ClientError::IndexOutOfRange {
                index,
                len: self.catalog.len(),
            });
        }
        self.draw(surface, index);
        Ok(&self.catalog[index])
    }

    /// Shows or hides the current overlay without changing the selection.
    pub fn set_visible(&mut self, surface: &mut impl MapSurface, visible: bool) {
        self.visible = visible;
        if let Some(overlay) = self.overlay {
            surface.set_overlay_visible(overlay, visible);
        }
    }

    fn draw(&mut self, surface: &mut impl MapSurface, index: usize) {
        if let Some(previous) = self.overlay.take() {
            surface.remove_overlay(previous);
        }
        self.overlay = Some(surface.add_shade_overlay(&self.catalog[index], self.visible));
        self.selected = Some(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::InMemorySurface;
    use serde_json::Map;

    fn layer(hour: u8, minute: u8) -> ShadeLayerDescriptor {
        ShadeLayerDescriptor {
            hour,
            minute,
            url: "http://tiles.local/geoserver/ows".into(),
            parameters: Map::new(),
        }
    }

    fn at(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    fn loaded(visible: bool) -> (ShadeLayerManager, InMemorySurface) {
        let mut surface = InMemorySurface::new();
        let mut manager = ShadeLayerManager::new(visible);
        assert!(manager.begin_load());
        manager
            .install_catalog(
                &mut surface,
                vec![layer(8, 0), layer(9, 0), layer(10, 0)],
                at(9, 10),
            )
            .unwrap();
        (manager, surface)
    }

    #[test]
    fn test_nearest_prefers_smaller_difference() {
        let layers = [layer(9, 0), layer(10, 0)];
        assert_eq!(nearest_index(&layers, at(9, 40)), Some(1));
        assert_eq!(nearest_index(&layers, at(9, 20)), Some(0));
    }

    #[test]
    fn test_nearest_tie_keeps_first() {
        let layers = [layer(9, 0), layer(10, 0)];
        assert_eq!(nearest_index(&layers, at(9, 30)), Some(0));
        assert_eq!(nearest_index(&[], at(9, 30)), None);
    }

    #[test]
    fn test_install_draws_single_overlay() {
        let (manager, surface) = loaded(false);
        assert_eq!(manager.selected_index(), Some(1));
        assert_eq!(manager.selected_time(), Some(at(9, 0)));
        let shades = surface.shade_overlays();
        assert_eq!(shades.len(), 1);
        assert_eq!(shades[0].0.hour, 9);
        assert!(!shades[0].1);
    }

    #[test]
    fn test_install_sorts_catalog() {
        let mut surface = InMemorySurface::new();
        let mut manager = ShadeLayerManager::new(false);
        manager
            .install_catalog(
                &mut surface,
                vec![layer(12, 0), layer(6, 30), layer(9, 0)],
                at(6, 0),
            )
            .unwrap();
        assert_eq!(manager.labels(), vec!["06:30", "09:00", "12:00"]);
        assert_eq!(manager.selected_index(), Some(0));
    }

    #[test]
    fn test_install_is_idempotent() {
        let (mut manager, mut surface) = loaded(false);
        assert!(!manager.begin_load());
        let index = manager
            .install_catalog(&mut surface, vec![layer(20, 0)], at(20, 0))
            .unwrap();
        assert_eq!(index, 1);
        assert_eq!(manager.catalog().len(), 3);
        assert_eq!(surface.shade_overlays().len(), 1);
    }

    #[test]
    fn test_empty_catalog_is_unavailable() {
        let mut surface = InMemorySurface::new();
        let mut manager = ShadeLayerManager::new(false);
        manager.begin_load();
        let err = manager
            .install_catalog(&mut surface, Vec::new(), at(9, 0))
            .unwrap_err();
        assert!(matches!(err, ClientError::CatalogUnavailable(_)));
        assert_eq!(manager.state(), CatalogState::Failed);
        assert!(surface.shade_overlays().is_empty());
        // a later explicit load may try again
        assert!(manager.begin_load());
    }

    #[test]
    fn test_select_index_replaces_overlay_and_keeps_visibility() {
        let (mut manager, mut surface) = loaded(false);
        manager.set_visible(&mut surface, true);
        let selected = manager.select_index(&mut surface, 2).unwrap();
        assert_eq!(selected.hour, 10);

        let shades = surface.shade_overlays();
        assert_eq!(shades.len(), 1);
        assert_eq!(shades[0].0.hour, 10);
        assert!(shades[0].1);
    }

    #[test]
    fn test_select_out_of_range_is_rejected() {
        let (mut manager, mut surface) = loaded(false);
        let err = manager.select_index(&mut surface, 3).unwrap_err();
        assert_eq!(err, ClientError::IndexOutOfRange { index: 3, len: 3 });
        assert_eq!(manager.selected_index(), Some(1));
        assert_eq!(surface.shade_overlays()[0].0.hour, 9);
    }

    #[test]
    fn test_select_before_load_is_rejected() {
        let mut surface = InMemorySurface::new();
        let mut manager = ShadeLayerManager::new(false);
        assert_eq!(
            manager.select_index(&mut surface, 0).unwrap_err(),
            ClientError::CatalogNotLoaded
        );
    }

    #[test]
    fn test_set_visible_keeps_selection() {
        let (mut manager, mut surface) = loaded(false);
        manager.set_visible(&mut surface, true);
        assert!(manager.is_visible());
        assert_eq!(manager.selected_index(), Some(1));
        assert!(surface.shade_overlays()[0].1);
        manager.set_visible(&mut surface, false);
        assert!(!surface.shade_overlays()[0].1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_nearest_is_minimal(
                times in prop::collection::vec((0u8..24, 0u8..60), 1..20),
                now in (0u8..24, 0u8..60),
            ) {
                let layers: Vec<_> = times.iter().map(|&(h, m)| layer(h, m)).collect();
                let now = at(now.0, now.1);
                let idx = nearest_index(&layers, now).unwrap();
                let diff = |l: &ShadeLayerDescriptor| {
                    l.time().minutes_since_midnight().abs_diff(now.minutes_since_midnight())
                };
                let chosen = diff(&layers[idx]);
                for (i, l) in layers.iter().enumerate() {
                    prop_assert!(diff(l) >= chosen);
                    if i < idx {
                        prop_assert!(diff(l) > chosen);
                    }
                }
            }
        }
    }
}
