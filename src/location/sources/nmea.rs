// src/location/sources/nmea.rs
//! Live position watch over an NMEA 0183 TCP feed

use super::spawn_line_watch;
use crate::{
    error::{GeoError, Result},
    location::{
        geolocation::{PositionEvent, PositionSink, PositionWatcher, WatchHandle, WatchOptions},
        reading::{Coordinates, PositionError},
    },
};
use log::info;
use tokio::{io::BufReader, net::TcpStream};

/// Parse a single NMEA sentence into a position event, if it carries one.
///
/// With `high_accuracy`, dead-reckoning (estimated) fixes are reported as
/// unavailable instead of as positions.
pub fn parse_nmea_sentence(line: &str, high_accuracy: bool) -> Option<PositionEvent> {
    let body = line.split('*').next().unwrap_or(line);
    let parts: Vec<&str> = body.split(',').collect();
    let talker = parts.first()?;

    if talker.len() != 6 || !talker.is_ascii() || !talker.starts_with('$') {
        return None;
    }

    match &talker[3..] {
        "GGA" => parse_gga(&parts, high_accuracy),
        "RMC" => parse_rmc(&parts, high_accuracy),
        _ => None,
    }
}

/// GGA (Fix Data): fields 2-5 position, field 6 fix quality (6 = estimated)
fn parse_gga(parts: &[&str], high_accuracy: bool) -> Option<PositionEvent> {
    if parts.len() < 7 {
        return None;
    }

    let quality = parts[6].parse::<u8>().unwrap_or(0);
    if quality == 0 {
        return Some(PositionEvent::Error(PositionError::unavailable("NMEA receiver reports no fix")));
    }
    if high_accuracy && quality == 6 {
        return Some(PositionEvent::Error(PositionError::unavailable("NMEA receiver reports an estimated fix")));
    }

    position_from_fields(parts[2], parts[3], parts[4], parts[5])
}

/// RMC (Recommended Minimum): field 2 status, fields 3-6 position, field 12 mode (E = estimated)
fn parse_rmc(parts: &[&str], high_accuracy: bool) -> Option<PositionEvent> {
    if parts.len() < 7 {
        return None;
    }

    if parts[2] != "A" {
        return Some(PositionEvent::Error(PositionError::unavailable("NMEA receiver reports void fix")));
    }
    if high_accuracy && parts.get(12) == Some(&"E") {
        return Some(PositionEvent::Error(PositionError::unavailable("NMEA receiver reports an estimated fix")));
    }

    position_from_fields(parts[3], parts[4], parts[5], parts[6])
}

fn position_from_fields(lat: &str, ns: &str, lon: &str, ew: &str) -> Option<PositionEvent> {
    let mut latitude = degrees_from_nmea(lat)?;
    let mut longitude = degrees_from_nmea(lon)?;

    match ns {
        "N" => {}
        "S" => latitude = -latitude,
        _ => return None,
    }
    match ew {
        "E" => {}
        "W" => longitude = -longitude,
        _ => return None,
    }

    let coordinates = Coordinates::new(latitude, longitude);
    coordinates
        .is_valid()
        .then_some(PositionEvent::Position(coordinates))
}

/// Convert `(d)ddmm.mmmm` to decimal degrees
fn degrees_from_nmea(field: &str) -> Option<f64> {
    if field.is_empty() {
        return None;
    }
    let raw = field.parse::<f64>().ok()?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    Some(degrees + minutes / 60.0)
}

/// Connect to a TCP endpoint streaming NMEA sentences
pub async fn connect_nmea(host: &str, port: u16) -> Result<BufReader<TcpStream>> {
    let stream = TcpStream::connect(format!("{}:{}", host, port))
        .await
        .map_err(|e| GeoError::Connection(format!("Failed to connect to NMEA feed at {}:{}: {}", host, port, e)))?;

    Ok(BufReader::new(stream))
}

/// Watches positions from an NMEA-over-TCP feed (GPS apps, multiplexers)
#[derive(Debug, Clone)]
pub struct NmeaWatcher {
    host: String,
    port: u16,
}

impl NmeaWatcher {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl PositionWatcher for NmeaWatcher {
    fn watch(&self, options: WatchOptions, sink: PositionSink) -> Result<WatchHandle> {
        info!("Watching NMEA feed at {}:{}", self.host, self.port);
        let host = self.host.clone();
        let port = self.port;
        let high_accuracy = options.enable_high_accuracy;

        Ok(spawn_line_watch(
            "NMEA",
            move || {
                let host = host.clone();
                async move { connect_nmea(&host, port).await }
            },
            move |line| parse_nmea_sentence(line, high_accuracy),
            options,
            sink,
        ))
    }
}
