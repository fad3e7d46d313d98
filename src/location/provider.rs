// src/location/provider.rs
//! Location provider: eager approximate lookup upgraded by a live watch

use super::{
    geolocation::{ApproximateLocator, PositionEvent, PositionWatcher, WatchHandle, WatchOptions},
    reading::{LocationReading, PositionError},
};
use log::{debug, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError, RwLock,
};
use tokio::{sync::mpsc, task::JoinHandle};

/// Owns the latest reading and the live subscription feeding it
pub struct LocationProvider {
    reading: Arc<RwLock<LocationReading>>,
    tracking: Arc<AtomicBool>,
    stopped: AtomicBool,
    watch: Mutex<Option<WatchHandle>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl LocationProvider {
    /// Start the provider: one approximate lookup and one live watch, concurrently.
    ///
    /// Must be called from within a tokio runtime. Failures never abort the
    /// provider: a failed lookup is ignored and a failed watch is recorded as
    /// the reading's error.
    pub fn start<A, W>(approximate: A, watcher: &W, options: WatchOptions) -> Self
    where
        A: ApproximateLocator,
        W: PositionWatcher + ?Sized,
    {
        let reading = Arc::new(RwLock::new(LocationReading::new()));
        let tracking = Arc::new(AtomicBool::new(true));
        let mut tasks = Vec::with_capacity(2);

        let lookup_reading = Arc::clone(&reading);
        tasks.push(tokio::spawn(async move {
            match approximate.approximate().await {
                Ok(location) => {
                    let mut guard = lookup_reading.write().unwrap_or_else(PoisonError::into_inner);
                    if guard.apply_approximate(&location) {
                        info!(
                            "Approximate location: {:.4}, {:.4} ({})",
                            location.latitude, location.longitude, location.precision
                        );
                    } else {
                        debug!("Approximate location ignored, live fix already present");
                    }
                }
                Err(e) => debug!("Approximate location lookup failed: {}", e),
            }
        }));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let watch = match watcher.watch(options, tx) {
            Ok(handle) => {
                let feed_reading = Arc::clone(&reading);
                let feed_tracking = Arc::clone(&tracking);
                tasks.push(tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if !feed_tracking.load(Ordering::SeqCst) {
                            break;
                        }
                        let mut guard = feed_reading.write().unwrap_or_else(PoisonError::into_inner);
                        match event {
                            PositionEvent::Position(coordinates) => guard.apply_position(coordinates),
                            PositionEvent::Error(error) => {
                                debug!("Live tracking error: {}", error);
                                guard.apply_error(error);
                            }
                        }
                    }
                }));
                Some(handle)
            }
            Err(e) => {
                warn!("Unable to start live tracking: {}", e);
                tracking.store(false, Ordering::SeqCst);
                reading
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply_error(PositionError::unavailable(e.to_string()));
                None
            }
        };

        Self {
            reading,
            tracking,
            stopped: AtomicBool::new(false),
            watch: Mutex::new(watch),
            tasks: Mutex::new(tasks),
        }
    }

    /// Provider holding a fixed reading with no lookup or watch behind it
    pub fn fixed(reading: LocationReading) -> Self {
        Self {
            reading: Arc::new(RwLock::new(reading)),
            tracking: Arc::new(AtomicBool::new(false)),
            stopped: AtomicBool::new(false),
            watch: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Get a snapshot of the latest known reading
    pub fn current_reading(&self) -> LocationReading {
        self.reading
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check if the live subscription is still delivering updates
    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::SeqCst)
    }

    /// Cancel the live subscription and any pending lookup. Safe to call any number of times.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.tracking.store(false, Ordering::SeqCst);
        for task in self.tasks.lock().unwrap_or_else(PoisonError::into_inner).drain(..) {
            task.abort();
        }
        if let Some(mut handle) = self.watch.lock().unwrap_or_else(PoisonError::into_inner).take() {
            if handle.cancel() {
                info!("Live tracking stopped");
            }
        }
    }
}

impl Drop for LocationProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}
