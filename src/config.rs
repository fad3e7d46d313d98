// src/config.rs
//! Configuration management with file storage

use crate::{
    error::{GeoError, Result},
    location::{
        sources::{
            approximate::AnyApproximateLocator, gpsd::DEFAULT_GPSD_PORT, DisabledWatcher,
            FixedApproximateLocator, GpsdWatcher, HttpApproximateLocator, NmeaWatcher,
            NoApproximateLocator,
        },
        ApproximateLocation, PositionWatcher, WatchOptions,
    },
    map::{view::DEFAULT_STYLE_URL, viewport::DEFAULT_PITCH, MapViewOptions},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_NMEA_PORT: u16 = 10110;

/// Where live positions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LiveSource {
    Gpsd,
    Nmea,
    None,
}

impl fmt::Display for LiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiveSource::Gpsd => "gpsd",
            LiveSource::Nmea => "nmea",
            LiveSource::None => "none",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub source_type: LiveSource,
    pub gpsd_host: String,
    pub gpsd_port: u16,
    pub nmea_host: String,
    pub nmea_port: u16,
    pub enable_high_accuracy: bool,
    /// Seconds without a position before a timeout error is reported
    pub watch_timeout_secs: Option<u64>,
    pub approximate_url: Option<String>,
    pub approximate_hint: Option<ApproximateLocation>,
    pub approximate_timeout_secs: u64,
    pub style_url: String,
    pub default_pitch: f64,
    pub no_control: bool,
    pub no_attribution: bool,
    pub hidden_layers: Vec<String>,
    /// Layer ids the text map surface exposes
    pub style_layers: Vec<String>,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            source_type: LiveSource::Gpsd,
            gpsd_host: "localhost".to_string(),
            gpsd_port: DEFAULT_GPSD_PORT,
            nmea_host: "localhost".to_string(),
            nmea_port: DEFAULT_NMEA_PORT,
            enable_high_accuracy: true,
            watch_timeout_secs: Some(30),
            approximate_url: None,
            approximate_hint: None,
            approximate_timeout_secs: 10,
            style_url: DEFAULT_STYLE_URL.to_string(),
            default_pitch: DEFAULT_PITCH,
            no_control: false,
            no_attribution: false,
            hidden_layers: Vec::new(),
            style_layers: vec![
                "background".to_string(),
                "water".to_string(),
                "roads".to_string(),
                "building".to_string(),
                "poi".to_string(),
                "place-labels".to_string(),
            ],
        }
    }
}

impl GeoConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load from `path`, falling back to defaults when the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| GeoError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GeoError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GeoError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(path, contents)
            .map_err(|e| GeoError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| GeoError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("geomap").join("config.json"))
    }

    pub fn update_source(&mut self, source: LiveSource) {
        self.source_type = source;
    }

    /// Update gpsd settings
    pub fn update_gpsd(&mut self, host: String, port: u16) {
        self.source_type = LiveSource::Gpsd;
        self.gpsd_host = host;
        self.gpsd_port = port;
    }

    /// Update NMEA feed settings
    pub fn update_nmea(&mut self, host: String, port: u16) {
        self.source_type = LiveSource::Nmea;
        self.nmea_host = host;
        self.nmea_port = port;
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: self.watch_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn view_options(&self) -> MapViewOptions {
        MapViewOptions {
            style_url: self.style_url.clone(),
            default_pitch: self.default_pitch,
            no_control: self.no_control,
            no_attribution: self.no_attribution,
            hidden_layers: self.hidden_layers.clone(),
        }
    }

    /// Live watcher for the configured source
    pub fn position_watcher(&self) -> Box<dyn PositionWatcher> {
        match self.source_type {
            LiveSource::Gpsd => Box::new(GpsdWatcher::new(self.gpsd_host.clone(), self.gpsd_port)),
            LiveSource::Nmea => Box::new(NmeaWatcher::new(self.nmea_host.clone(), self.nmea_port)),
            LiveSource::None => Box::new(DisabledWatcher),
        }
    }

    /// Approximate lookup: URL first, then the configured hint
    pub fn approximate_locator(&self) -> Result<AnyApproximateLocator> {
        if let Some(url) = &self.approximate_url {
            let timeout = Duration::from_secs(self.approximate_timeout_secs);
            return Ok(AnyApproximateLocator::Http(HttpApproximateLocator::new(url.clone(), timeout)?));
        }
        Ok(match self.approximate_hint {
            Some(hint) => AnyApproximateLocator::Fixed(FixedApproximateLocator(hint)),
            None => AnyApproximateLocator::None(NoApproximateLocator),
        })
    }
}
