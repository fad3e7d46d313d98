// src/location/geolocation.rs
//! Geolocation capability seams: one-shot approximate lookup and live watch

use super::reading::{ApproximateLocation, Coordinates, PositionError};
use crate::error::Result;
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::mpsc, task::JoinHandle};

/// Single emission of a live position feed
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Position(Coordinates),
    Error(PositionError),
}

/// Channel end a watcher pushes its emissions into
pub type PositionSink = mpsc::UnboundedSender<PositionEvent>;

/// Options for a live position watch
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Reject degraded fixes (gpsd 2D fixes, NMEA estimated fixes)
    pub enable_high_accuracy: bool,
    /// Emit a timeout error when no position arrives within this window
    pub timeout: Option<Duration>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: None,
        }
    }
}

/// Best-effort one-shot location hint (IP lookup, configured default, ...)
pub trait ApproximateLocator: Send + Sync + 'static {
    fn approximate(&self) -> impl Future<Output = Result<ApproximateLocation>> + Send;
}

/// Continuous position feed
pub trait PositionWatcher: Send + Sync + 'static {
    /// Start delivering events into `sink` until the returned handle is cancelled
    fn watch(&self, options: WatchOptions, sink: PositionSink) -> Result<WatchHandle>;
}

/// Scoped live subscription. Cancelling is idempotent and dropping cancels.
#[derive(Debug)]
pub struct WatchHandle {
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Handle owning the task that feeds the sink
    pub fn new(running: Arc<AtomicBool>, task: JoinHandle<()>) -> Self {
        Self {
            running,
            task: Some(task),
        }
    }

    /// Handle for feeds driven from outside a task, sharing only the flag
    pub fn from_flag(running: Arc<AtomicBool>) -> Self {
        Self {
            running,
            task: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the feed. Returns `true` only for the call that actually stopped it.
    pub fn cancel(&mut self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        true
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
