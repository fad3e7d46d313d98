// src/location/sources/gpsd.rs
//! Live position watch backed by a gpsd daemon

use super::spawn_line_watch;
use crate::{
    error::{GeoError, Result},
    location::{
        geolocation::{PositionEvent, PositionSink, PositionWatcher, WatchHandle, WatchOptions},
        reading::{Coordinates, PositionError},
    },
};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};

pub const DEFAULT_GPSD_PORT: u16 = 2947;

#[derive(Debug, Deserialize)]
struct GpsdMessage {
    class: String,
    #[serde(flatten)]
    data: HashMap<String, serde_json::Value>,
}

/// Connect to a gpsd daemon and return a stream reader
pub async fn connect_gpsd(host: &str, port: u16) -> Result<BufReader<TcpStream>> {
    let mut stream = TcpStream::connect(format!("{}:{}", host, port))
        .await
        .map_err(|e| GeoError::Connection(format!("Failed to connect to gpsd at {}:{}: {}", host, port, e)))?;

    // Send WATCH command to start receiving JSON data
    stream
        .write_all(b"?WATCH={\"enable\":true,\"json\":true}\n")
        .await
        .map_err(|e| GeoError::Connection(format!("Failed to send WATCH command: {}", e)))?;

    Ok(BufReader::new(stream))
}

/// Parse a single line of gpsd JSON into a position event, if it carries one.
///
/// With `high_accuracy`, only 3D fixes count as positions.
pub fn parse_gpsd_json(line: &str, high_accuracy: bool) -> Result<Option<PositionEvent>> {
    let msg: GpsdMessage = serde_json::from_str(line)
        .map_err(|e| GeoError::Parse(format!("Failed to parse gpsd JSON: {}", e)))?;

    let event = match msg.class.as_str() {
        "TPV" => parse_tpv_message(&msg.data, high_accuracy),
        "VERSION" => {
            if let Some(version) = msg.data.get("release").and_then(|v| v.as_str()) {
                info!("Connected to gpsd version: {}", version);
            }
            None
        }
        "DEVICES" => {
            if let Some(devices) = msg.data.get("devices").and_then(|v| v.as_array()) {
                info!("gpsd managing {} device(s)", devices.len());
            }
            None
        }
        _ => None,
    };

    Ok(event)
}

/// TPV (Time Position Velocity): mode 2 is a 2D fix, mode 3 a 3D fix, lower modes mean none
fn parse_tpv_message(msg_data: &HashMap<String, serde_json::Value>, high_accuracy: bool) -> Option<PositionEvent> {
    let mode = msg_data.get("mode").and_then(|v| v.as_u64()).unwrap_or(0);
    if mode < 2 {
        return Some(PositionEvent::Error(PositionError::unavailable("gpsd reports no fix")));
    }
    if high_accuracy && mode < 3 {
        return Some(PositionEvent::Error(PositionError::unavailable("gpsd reports a 2D fix only")));
    }

    let lat = msg_data.get("lat").and_then(|v| v.as_f64())?;
    let lon = msg_data.get("lon").and_then(|v| v.as_f64())?;
    let coordinates = Coordinates::new(lat, lon);
    coordinates
        .is_valid()
        .then_some(PositionEvent::Position(coordinates))
}

/// Watches positions reported by gpsd, reconnecting while active
#[derive(Debug, Clone)]
pub struct GpsdWatcher {
    host: String,
    port: u16,
}

impl GpsdWatcher {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl PositionWatcher for GpsdWatcher {
    fn watch(&self, options: WatchOptions, sink: PositionSink) -> Result<WatchHandle> {
        info!("Watching gpsd at {}:{}", self.host, self.port);
        let host = self.host.clone();
        let port = self.port;
        let high_accuracy = options.enable_high_accuracy;

        Ok(spawn_line_watch(
            "gpsd",
            move || {
                let host = host.clone();
                async move { connect_gpsd(&host, port).await }
            },
            move |line| match parse_gpsd_json(line, high_accuracy) {
                Ok(event) => event,
                Err(e) => {
                    debug!("{}", e);
                    None
                }
            },
            options,
            sink,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::PositionErrorKind;

    #[test]
    fn test_tpv_parsing() {
        let json = r#"{"class":"TPV","device":"/dev/ttyUSB0","mode":3,"time":"2023-01-01T12:00:00.000Z","ept":0.005,"lat":48.117,"lon":11.517,"alt":545.4,"track":10.3797,"speed":0.091}"#;

        let event = parse_gpsd_json(json, true).unwrap();
        assert_eq!(event, Some(PositionEvent::Position(Coordinates::new(48.117, 11.517))));
    }

    #[test]
    fn test_tpv_without_fix() {
        let json = r#"{"class":"TPV","device":"/dev/ttyUSB0","mode":1}"#;

        match parse_gpsd_json(json, true).unwrap() {
            Some(PositionEvent::Error(e)) => assert_eq!(e.kind, PositionErrorKind::PositionUnavailable),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_2d_fix_depends_on_accuracy() {
        let json = r#"{"class":"TPV","device":"/dev/ttyUSB0","mode":2,"lat":48.117,"lon":11.517}"#;

        match parse_gpsd_json(json, true).unwrap() {
            Some(PositionEvent::Error(e)) => assert_eq!(e.kind, PositionErrorKind::PositionUnavailable),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(
            parse_gpsd_json(json, false).unwrap(),
            Some(PositionEvent::Position(Coordinates::new(48.117, 11.517)))
        );
    }

    #[test]
    fn test_sky_is_ignored() {
        let json = r#"{"class":"SKY","device":"/dev/ttyUSB0","hdop":1.2,"satellites":[{"PRN":1,"ss":42,"used":true}]}"#;
        assert_eq!(parse_gpsd_json(json, true).unwrap(), None);
    }

    #[test]
    fn test_invalid_json() {
        let result = parse_gpsd_json(r#"{"invalid": json"#, true);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_watch_reports_unreachable_daemon() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        // Port 1 on localhost is reserved and refuses connections
        let watcher = GpsdWatcher::new("127.0.0.1", 1);
        let mut handle = watcher.watch(WatchOptions::default(), tx).unwrap();

        match rx.recv().await {
            Some(PositionEvent::Error(e)) => assert_eq!(e.kind, PositionErrorKind::PositionUnavailable),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(handle.cancel());
    }
}
