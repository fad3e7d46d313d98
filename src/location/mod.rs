// src/location/mod.rs
//! Location acquisition: approximate hint first, live tracking after

pub mod geolocation;
pub mod provider;
pub mod reading;
pub mod sources;

pub use geolocation::{
    ApproximateLocator, PositionEvent, PositionSink, PositionWatcher, WatchHandle, WatchOptions,
};
pub use provider::LocationProvider;
pub use reading::{
    ApproximateLocation, Coordinates, LocationReading, PositionError, PositionErrorKind, Precision,
};
