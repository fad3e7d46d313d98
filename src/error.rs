// src/error.rs
//! Error types for the location provider and map runtime

use std::fmt;

pub type Result<T> = std::result::Result<T, GeoError>;

#[derive(Debug)]
pub enum GeoError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    Connection(String),
    Parse(String),
    Config(String),
    Other(String),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::Io(e) => write!(f, "IO error: {}", e),
            GeoError::Json(e) => write!(f, "JSON error: {}", e),
            GeoError::Http(e) => write!(f, "HTTP error: {}", e),
            GeoError::Connection(msg) => write!(f, "Connection error: {}", msg),
            GeoError::Parse(msg) => write!(f, "Parse error: {}", msg),
            GeoError::Config(msg) => write!(f, "Config error: {}", msg),
            GeoError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for GeoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeoError::Io(e) => Some(e),
            GeoError::Json(e) => Some(e),
            GeoError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeoError {
    fn from(error: std::io::Error) -> Self {
        GeoError::Io(error)
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(error: serde_json::Error) -> Self {
        GeoError::Json(error)
    }
}

impl From<reqwest::Error> for GeoError {
    fn from(error: reqwest::Error) -> Self {
        GeoError::Http(error)
    }
}
