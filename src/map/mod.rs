// src/map/mod.rs
//! Map root view, shared map handle and overlay module registry

pub mod handle;
pub mod modules;
pub mod registry;
pub mod view;
pub mod viewport;

pub use handle::{MapInit, MapRef, MapSurface, NavigationControl, Visibility};
pub use registry::{
    ComposedModule, ExtraProps, ModuleEntry, ModuleId, ModuleKey, ModuleRegistry, ModuleSlot,
    RenderNode, Renderer,
};
pub use view::{LoadReport, MapView, MapViewOptions};
pub use viewport::{initial_view_state, zoom_for, ViewState, FRANCE_CENTER};
