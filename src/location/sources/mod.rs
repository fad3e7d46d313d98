// src/location/sources/mod.rs
//! Concrete geolocation collaborators

pub mod approximate;
pub mod gpsd;
pub mod nmea;

pub use approximate::{
    AnyApproximateLocator, FixedApproximateLocator, HttpApproximateLocator, NoApproximateLocator,
};
pub use gpsd::GpsdWatcher;
pub use nmea::NmeaWatcher;

use super::{
    geolocation::{PositionEvent, PositionSink, PositionWatcher, WatchHandle, WatchOptions},
    reading::PositionError,
};
use crate::error::{GeoError, Result};
use log::{info, warn};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    time::{timeout_at, Instant},
};

/// Delay between reconnection attempts of a line-oriented feed
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Watcher used when live tracking is turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledWatcher;

impl PositionWatcher for DisabledWatcher {
    fn watch(&self, _options: WatchOptions, _sink: PositionSink) -> Result<WatchHandle> {
        Err(GeoError::Config("Live tracking disabled".to_string()))
    }
}

/// How a line feed ended
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FeedEnd {
    /// Stream closed or failed, a reconnect may help
    Closed,
    /// Watch cancelled or nobody listens anymore
    Stopped,
}

/// Pump lines from `reader` through `parse` into the sink.
///
/// With a `timeout`, a timeout error is emitted whenever no position has been
/// parsed within the window; other traffic does not reset it. Bytes of a line
/// interrupted by the timeout are kept for the next read.
pub(crate) async fn feed_lines<R, P>(
    reader: &mut R,
    sink: &PositionSink,
    running: &AtomicBool,
    timeout: Option<Duration>,
    parse: &mut P,
) -> FeedEnd
where
    R: AsyncBufRead + Unpin,
    P: FnMut(&str) -> Option<PositionEvent>,
{
    let mut buf = Vec::new();
    let mut deadline = timeout.map(|limit| Instant::now() + limit);

    while running.load(Ordering::SeqCst) {
        let read = match (timeout, deadline) {
            (Some(limit), Some(at)) => match timeout_at(at, reader.read_until(b'\n', &mut buf)).await {
                Ok(read) => read,
                Err(_) => {
                    let error = PositionError::timeout(format!("No position within {:?}", limit));
                    if sink.send(PositionEvent::Error(error)).is_err() {
                        return FeedEnd::Stopped;
                    }
                    deadline = Some(Instant::now() + limit);
                    continue;
                }
            },
            _ => reader.read_until(b'\n', &mut buf).await,
        };

        match read {
            Ok(0) => return FeedEnd::Closed,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim().to_string();
                buf.clear();
                if line.is_empty() {
                    continue;
                }
                if let Some(event) = parse(&line) {
                    if matches!(event, PositionEvent::Position(_)) {
                        deadline = timeout.map(|limit| Instant::now() + limit);
                    }
                    if sink.send(event).is_err() {
                        return FeedEnd::Stopped;
                    }
                }
            }
            Err(e) => {
                warn!("Read error on position feed: {}", e);
                return FeedEnd::Closed;
            }
        }
    }

    FeedEnd::Stopped
}

/// Spawn a reconnecting watch over a line-oriented feed
pub(crate) fn spawn_line_watch<C, Fut, R, P>(
    label: &'static str,
    connect: C,
    mut parse: P,
    options: WatchOptions,
    sink: PositionSink,
) -> WatchHandle
where
    C: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: AsyncBufRead + Unpin + Send + 'static,
    P: FnMut(&str) -> Option<PositionEvent> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(true));
    let task_running = Arc::clone(&running);

    let task = tokio::spawn(async move {
        while task_running.load(Ordering::SeqCst) {
            match connect().await {
                Ok(mut reader) => {
                    info!("Connected to {} feed", label);
                    let end = feed_lines(&mut reader, &sink, &task_running, options.timeout, &mut parse).await;
                    if end == FeedEnd::Stopped {
                        break;
                    }
                    let error = PositionError::unavailable(format!("{} feed closed", label));
                    if sink.send(PositionEvent::Error(error)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    if sink.send(PositionEvent::Error(PositionError::unavailable(e.to_string()))).is_err() {
                        break;
                    }
                }
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    });

    WatchHandle::new(running, task)
}
