// src/map/view.rs
//! Map root view: owns the map handle and composes registered modules

use super::{
    handle::{MapInit, MapRef, MapSurface, NavigationControl, Visibility},
    registry::{ComposedModule, ModuleRegistry},
    viewport::{initial_view_state, ViewState, DEFAULT_PITCH},
};
use crate::{error::Result, location::LocationProvider};
use log::{debug, error, info};

pub const DEFAULT_STYLE_URL: &str = "https://demotiles.maplibre.org/style.json";

#[derive(Debug, Clone, PartialEq)]
pub struct MapViewOptions {
    pub style_url: String,
    pub default_pitch: f64,
    pub no_control: bool,
    pub no_attribution: bool,
    /// Style layer ids hidden once the map has loaded
    pub hidden_layers: Vec<String>,
}

impl Default for MapViewOptions {
    fn default() -> Self {
        Self {
            style_url: DEFAULT_STYLE_URL.to_string(),
            default_pitch: DEFAULT_PITCH,
            no_control: false,
            no_attribution: false,
            hidden_layers: Vec::new(),
        }
    }
}

/// What the load callback managed to apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub map_available: bool,
    pub control_added: bool,
    pub hidden_layers: Vec<String>,
    pub skipped_layers: Vec<String>,
}

pub struct MapView {
    map: MapRef,
    registry: ModuleRegistry,
    initial_view_state: ViewState,
    options: MapViewOptions,
}

impl MapView {
    /// Create the root view. The location is read once, here, to seed the viewport.
    pub fn new(registry: ModuleRegistry, location: &LocationProvider, options: MapViewOptions) -> Self {
        let reading = location.current_reading();
        let initial_view_state = initial_view_state(Some(&reading), options.default_pitch);
        debug!(
            "Initial view: {:.4}, {:.4} at zoom {}",
            initial_view_state.latitude, initial_view_state.longitude, initial_view_state.zoom
        );

        Self {
            map: MapRef::new(),
            registry,
            initial_view_state,
            options,
        }
    }

    /// Handle given to modules
    pub fn map_ref(&self) -> MapRef {
        self.map.clone()
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn options(&self) -> &MapViewOptions {
        &self.options
    }

    pub fn initial_view_state(&self) -> ViewState {
        self.initial_view_state
    }

    pub fn interactive(&self) -> bool {
        !self.options.no_control
    }

    /// Parameters handed to the map rendering capability
    pub fn map_init(&self) -> MapInit {
        MapInit {
            style_url: self.options.style_url.clone(),
            view_state: self.initial_view_state,
            interactive: self.interactive(),
            attribution: !self.options.no_attribution,
        }
    }

    /// Create the map surface and attach it to the shared handle.
    ///
    /// A failing surface leaves the handle empty; the load callback reports it.
    pub fn mount<F>(&self, create: F) -> bool
    where
        F: FnOnce(&MapInit) -> Result<Box<dyn MapSurface>>,
    {
        match create(&self.map_init()) {
            Ok(surface) => {
                self.map.attach(surface);
                true
            }
            Err(e) => {
                error!("Map surface creation failed: {}", e);
                false
            }
        }
    }

    /// Load callback: navigation control and layer visibility tweaks
    pub fn on_load(&self) -> LoadReport {
        let mut report = LoadReport::default();

        let applied = self.map.with_map_mut(|map| {
            if !self.options.no_control {
                map.add_control(NavigationControl::default());
                report.control_added = true;
            }

            debug!("Map loaded. Applying style modifications...");
            for layer_id in &self.options.hidden_layers {
                if !map.has_layer(layer_id) {
                    info!(
                        "Layer to hide not found: {}. IDs may vary depending on the style.",
                        layer_id
                    );
                    report.skipped_layers.push(layer_id.clone());
                    continue;
                }
                match map.set_layer_visibility(layer_id, Visibility::None) {
                    Ok(()) => {
                        debug!("Layer hidden: {}", layer_id);
                        report.hidden_layers.push(layer_id.clone());
                    }
                    Err(e) => {
                        info!("Unable to hide layer {}: {}", layer_id, e);
                        report.skipped_layers.push(layer_id.clone());
                    }
                }
            }
            debug!("Style modifications completed.");
        });

        if applied.is_none() {
            error!("Map instance not found.");
            return report;
        }
        report.map_available = true;
        report
    }

    /// Compose registered modules; nothing until the map is ready
    pub fn render(&self) -> Vec<ComposedModule> {
        if !self.map.is_ready() {
            return Vec::new();
        }
        self.registry.compose(&self.map)
    }

    /// Destroy the map surface
    pub fn unmount(&self) {
        if self.map.detach() {
            debug!("Map surface detached");
        }
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        self.unmount();
    }
}
