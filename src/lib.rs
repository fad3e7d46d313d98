// src/lib.rs
//! geomap library
//!
//! A location provider (approximate hint first, live tracking after) and a
//! map root view that composes independently registered overlay modules.

pub mod config;
pub mod display;
pub mod error;
pub mod location;
pub mod map;

// Re-export main types for convenience
pub use config::{GeoConfig, LiveSource};
pub use error::{GeoError, Result};
pub use location::{LocationProvider, LocationReading, Precision};
pub use map::{MapView, MapViewOptions, ModuleRegistry, ModuleSlot, Renderer};
