// src/map/viewport.rs
//! Viewport state and initial centering from a location reading

use crate::location::{Coordinates, LocationReading, Precision};
use serde::{Deserialize, Serialize};

/// Fallback center when no usable reading exists (continental France)
pub const FRANCE_CENTER: Coordinates = Coordinates {
    latitude: 46.603354,
    longitude: 1.888334,
};

pub const CITY_ZOOM: f64 = 13.0;
pub const COUNTRY_ZOOM: f64 = 6.0;
pub const PRECISE_ZOOM: f64 = 15.0;

pub const DEFAULT_PITCH: f64 = 25.0;

/// Zoom level matching a precision tier; unknown falls back to country level
pub fn zoom_for(precision: Precision) -> f64 {
    match precision {
        Precision::City => CITY_ZOOM,
        Precision::Country | Precision::Unknown => COUNTRY_ZOOM,
        Precision::Precise => PRECISE_ZOOM,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

impl ViewState {
    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Initial viewport for the map root, seeded from a one-time reading
pub fn initial_view_state(reading: Option<&LocationReading>, pitch: f64) -> ViewState {
    let seeded = reading.and_then(|r| match (r.coordinates, r.precision) {
        (_, Precision::Unknown) | (None, _) => None,
        (Some(center), precision) => Some((center, zoom_for(precision))),
    });
    let (center, zoom) = seeded.unwrap_or((FRANCE_CENTER, COUNTRY_ZOOM));

    ViewState {
        latitude: center.latitude,
        longitude: center.longitude,
        zoom,
        bearing: 0.0,
        pitch,
    }
}
