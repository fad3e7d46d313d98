// src/display/surface.rs
//! Text-mode map surface: tracks viewport, controls and layer visibility

use crate::{
    error::{GeoError, Result},
    map::{MapInit, MapSurface, NavigationControl, ViewState, Visibility},
};

#[derive(Debug, Clone)]
pub struct TextMapSurface {
    style_url: String,
    view: ViewState,
    interactive: bool,
    attribution: bool,
    controls: Vec<NavigationControl>,
    layers: Vec<(String, Visibility)>,
}

impl TextMapSurface {
    pub fn new(init: &MapInit, layers: &[String]) -> Self {
        Self {
            style_url: init.style_url.clone(),
            view: init.view_state,
            interactive: init.interactive,
            attribution: init.attribution,
            controls: Vec::new(),
            layers: layers
                .iter()
                .map(|id| (id.clone(), Visibility::Visible))
                .collect(),
        }
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn controls(&self) -> &[NavigationControl] {
        &self.controls
    }

    /// Ids of the layers currently shown
    pub fn visible_layers(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|(_, visibility)| *visibility == Visibility::Visible)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

impl MapSurface for TextMapSurface {
    fn style_url(&self) -> &str {
        &self.style_url
    }

    fn view_state(&self) -> ViewState {
        self.view
    }

    fn set_view_state(&mut self, view: ViewState) {
        self.view = view;
    }

    fn attribution_enabled(&self) -> bool {
        self.attribution
    }

    fn add_control(&mut self, control: NavigationControl) {
        self.controls.push(control);
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|(layer, _)| layer == id)
    }

    fn set_layer_visibility(&mut self, id: &str, visibility: Visibility) -> Result<()> {
        let layer = self
            .layers
            .iter_mut()
            .find(|(layer, _)| layer == id)
            .ok_or_else(|| GeoError::Other(format!("Unknown layer: {}", id)))?;
        layer.1 = visibility;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::initial_view_state;

    fn surface() -> TextMapSurface {
        let init = MapInit {
            style_url: "https://example.org/style.json".to_string(),
            view_state: initial_view_state(None, 25.0),
            interactive: true,
            attribution: true,
        };
        TextMapSurface::new(&init, &["water".to_string(), "poi".to_string()])
    }

    #[test]
    fn test_hide_layer() {
        let mut map = surface();
        map.set_layer_visibility("poi", Visibility::None).unwrap();
        assert_eq!(map.visible_layers(), vec!["water"]);
    }

    #[test]
    fn test_unknown_layer_rejected() {
        let mut map = surface();
        assert!(!map.has_layer("building"));
        assert!(map.set_layer_visibility("building", Visibility::None).is_err());
    }
}
