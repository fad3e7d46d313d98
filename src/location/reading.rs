// src/location/reading.rs
//! Location reading data structures and overwrite rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components are finite and inside the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Provenance/confidence tier of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    City,
    Country,
    Precise,
    #[default]
    Unknown,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::City => "city",
            Precision::Country => "country",
            Precision::Precise => "precise",
            Precision::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Kind of failure reported by live tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unknown,
}

/// Structured live-tracking failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionError {
    pub kind: PositionErrorKind,
    pub message: String,
}

impl PositionError {
    pub fn new(kind: PositionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(PositionErrorKind::PermissionDenied, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(PositionErrorKind::PositionUnavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PositionErrorKind::Timeout, message)
    }

    /// Short hint suitable for user-facing feedback
    pub fn hint(&self) -> &'static str {
        match self.kind {
            PositionErrorKind::PermissionDenied => "Enable location permissions",
            PositionErrorKind::PositionUnavailable => "Position unavailable",
            PositionErrorKind::Timeout => "Waiting for a position fix",
            PositionErrorKind::Unknown => "Location error",
        }
    }
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PositionError {}

/// Result of a one-shot approximate lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApproximateLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub precision: Precision,
}

impl ApproximateLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Latest known location as exposed by the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationReading {
    pub coordinates: Option<Coordinates>,
    pub precision: Precision,
    pub error: Option<PositionError>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LocationReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the reading holds a position
    pub fn has_position(&self) -> bool {
        self.coordinates.is_some()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.longitude)
    }

    /// Get the age of the position in seconds
    pub fn age_seconds(&self) -> Option<i64> {
        self.updated_at
            .map(|ts| Utc::now().signed_duration_since(ts).num_seconds())
    }

    /// Apply the approximate lookup result.
    ///
    /// Returns `false` when the reading already holds a live fix, which an
    /// approximate hint must never replace.
    pub fn apply_approximate(&mut self, location: &ApproximateLocation) -> bool {
        if self.precision == Precision::Precise {
            return false;
        }
        self.coordinates = Some(location.coordinates());
        self.precision = location.precision;
        self.updated_at = Some(Utc::now());
        true
    }

    /// Apply a live position: overwrites the position and clears the error
    pub fn apply_position(&mut self, coordinates: Coordinates) {
        self.coordinates = Some(coordinates);
        self.precision = Precision::Precise;
        self.error = None;
        self.updated_at = Some(Utc::now());
    }

    /// Apply a live failure: the last good position is kept
    pub fn apply_error(&mut self, error: PositionError) {
        self.error = Some(error);
    }

    /// Format coordinate for display
    pub fn format_coordinate(coord: Option<f64>) -> String {
        match coord {
            Some(val) => format!("{:>12.6}°", val),
            None => "No fix".to_string(),
        }
    }
}
