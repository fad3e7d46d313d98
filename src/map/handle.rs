// src/map/handle.rs
//! Shared reference to the single map surface

use super::viewport::ViewState;
use crate::error::Result;
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

/// Layer layout visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    None,
}

/// Zoom/compass navigation widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationControl {
    pub show_compass: bool,
    pub show_zoom: bool,
}

impl Default for NavigationControl {
    fn default() -> Self {
        Self {
            show_compass: true,
            show_zoom: true,
        }
    }
}

/// Parameters a map surface is created with
#[derive(Debug, Clone, PartialEq)]
pub struct MapInit {
    pub style_url: String,
    pub view_state: ViewState,
    pub interactive: bool,
    pub attribution: bool,
}

/// The external map rendering capability
pub trait MapSurface: Send + Sync {
    fn style_url(&self) -> &str;

    fn view_state(&self) -> ViewState;

    fn set_view_state(&mut self, view: ViewState);

    fn attribution_enabled(&self) -> bool;

    fn add_control(&mut self, control: NavigationControl);

    fn has_layer(&self, id: &str) -> bool;

    fn set_layer_visibility(&mut self, id: &str, visibility: Visibility) -> Result<()>;
}

/// Handle to the map surface shared by the root view and its modules.
///
/// Modules can read and issue commands through it; only the root view can
/// attach or detach the surface.
#[derive(Clone, Default)]
pub struct MapRef {
    inner: Arc<RwLock<Option<Box<dyn MapSurface>>>>,
}

impl MapRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a surface is attached
    pub fn is_ready(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run `f` against the surface, if attached
    pub fn with_map<R>(&self, f: impl FnOnce(&dyn MapSurface) -> R) -> Option<R> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_deref().map(|surface| f(surface))
    }

    /// Run a command against the surface, if attached
    pub fn with_map_mut<R>(&self, f: impl FnOnce(&mut dyn MapSurface) -> R) -> Option<R> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.as_deref_mut().map(|surface| f(surface))
    }

    pub(crate) fn attach(&self, surface: Box<dyn MapSurface>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(surface);
    }

    pub(crate) fn detach(&self) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapRef")
            .field("ready", &self.is_ready())
            .finish()
    }
}
