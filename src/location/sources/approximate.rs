// src/location/sources/approximate.rs
//! Approximate (city/country granularity) location lookups

use crate::{
    error::{GeoError, Result},
    location::{
        geolocation::ApproximateLocator,
        reading::{ApproximateLocation, Precision},
    },
};
use log::debug;
use std::time::Duration;

const USER_AGENT: &str = "geomap/0.1 (Rust location runtime)";

/// Looks up an approximate location from an HTTP endpoint.
///
/// The endpoint answers a GET with `{"latitude":..,"longitude":..,"precision":"city"}`.
#[derive(Debug, Clone)]
pub struct HttpApproximateLocator {
    url: String,
    client: reqwest::Client,
}

impl HttpApproximateLocator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl ApproximateLocator for HttpApproximateLocator {
    async fn approximate(&self) -> Result<ApproximateLocation> {
        debug!("Requesting approximate location from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(GeoError::Other(format!("HTTP error: {}", response.status())));
        }

        let location: ApproximateLocation = response.json().await?;
        validate(location)
    }
}

/// Returns a configured location hint
#[derive(Debug, Clone, Copy)]
pub struct FixedApproximateLocator(pub ApproximateLocation);

impl ApproximateLocator for FixedApproximateLocator {
    async fn approximate(&self) -> Result<ApproximateLocation> {
        validate(self.0)
    }
}

/// Lookup that never resolves a location
#[derive(Debug, Clone, Copy, Default)]
pub struct NoApproximateLocator;

impl ApproximateLocator for NoApproximateLocator {
    async fn approximate(&self) -> Result<ApproximateLocation> {
        Err(GeoError::Other("No approximate location source configured".to_string()))
    }
}

/// Any approximate source: picked at runtime from configuration
#[derive(Debug, Clone)]
pub enum AnyApproximateLocator {
    Http(HttpApproximateLocator),
    Fixed(FixedApproximateLocator),
    None(NoApproximateLocator),
}

impl ApproximateLocator for AnyApproximateLocator {
    async fn approximate(&self) -> Result<ApproximateLocation> {
        match self {
            AnyApproximateLocator::Http(locator) => locator.approximate().await,
            AnyApproximateLocator::Fixed(locator) => locator.approximate().await,
            AnyApproximateLocator::None(locator) => locator.approximate().await,
        }
    }
}

fn validate(location: ApproximateLocation) -> Result<ApproximateLocation> {
    if !location.coordinates().is_valid() {
        return Err(GeoError::Parse(format!(
            "Approximate location out of range: {}, {}",
            location.latitude, location.longitude
        )));
    }
    if location.precision == Precision::Unknown {
        return Err(GeoError::Parse("Approximate location without precision".to_string()));
    }
    Ok(location)
}
