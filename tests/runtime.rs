// tests/runtime.rs
//! End-to-end behaviour of the provider, the map view and the module registry

use geomap::{
    error::{GeoError, Result},
    location::{
        ApproximateLocation, ApproximateLocator, Coordinates, LocationProvider, LocationReading,
        PositionError, PositionErrorKind, PositionEvent, PositionSink, PositionWatcher, Precision,
        WatchHandle, WatchOptions,
    },
    map::{ExtraProps, MapRef, MapView, MapViewOptions, ModuleRegistry, RenderNode, Renderer, FRANCE_CENTER},
};
use std::{
    sync::{atomic::AtomicBool, Arc, Mutex},
    time::Duration,
};
use tokio::sync::Notify;

/// Approximate lookup that answers only once released
struct GatedLookup {
    gate: Arc<Notify>,
    answer: ApproximateLocation,
}

impl ApproximateLocator for GatedLookup {
    async fn approximate(&self) -> Result<ApproximateLocation> {
        self.gate.notified().await;
        Ok(self.answer)
    }
}

struct NoLookup;

impl ApproximateLocator for NoLookup {
    async fn approximate(&self) -> Result<ApproximateLocation> {
        Err(GeoError::Other("offline".to_string()))
    }
}

#[derive(Default)]
struct ScriptedWatcher {
    sink: Mutex<Option<PositionSink>>,
}

impl ScriptedWatcher {
    fn emit(&self, event: PositionEvent) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            let _ = sink.send(event);
        }
    }
}

impl PositionWatcher for ScriptedWatcher {
    fn watch(&self, _options: WatchOptions, sink: PositionSink) -> Result<WatchHandle> {
        *self.sink.lock().unwrap() = Some(sink);
        Ok(WatchHandle::from_flag(Arc::new(AtomicBool::new(true))))
    }
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn city() -> ApproximateLocation {
    ApproximateLocation {
        latitude: 48.8566,
        longitude: 2.3522,
        precision: Precision::City,
    }
}

#[tokio::test]
async fn last_live_emission_wins_over_late_lookup() {
    let gate = Arc::new(Notify::new());
    let lookup = GatedLookup {
        gate: Arc::clone(&gate),
        answer: city(),
    };
    let watcher = ScriptedWatcher::default();
    let provider = LocationProvider::start(lookup, &watcher, WatchOptions::default());

    watcher.emit(PositionEvent::Position(Coordinates::new(43.6, 1.44)));
    watcher.emit(PositionEvent::Position(Coordinates::new(43.61, 1.45)));
    settle().await;

    gate.notify_one();
    settle().await;

    let reading = provider.current_reading();
    assert_eq!(reading.coordinates, Some(Coordinates::new(43.61, 1.45)));
    assert_eq!(reading.precision, Precision::Precise);
}

#[tokio::test]
async fn lookup_then_live_upgrade() {
    let gate = Arc::new(Notify::new());
    gate.notify_one();
    let lookup = GatedLookup { gate, answer: city() };
    let watcher = ScriptedWatcher::default();
    let provider = LocationProvider::start(lookup, &watcher, WatchOptions::default());
    settle().await;

    assert_eq!(provider.current_reading().precision, Precision::City);

    watcher.emit(PositionEvent::Position(Coordinates::new(48.86, 2.35)));
    settle().await;

    let reading = provider.current_reading();
    assert_eq!(reading.precision, Precision::Precise);
    assert_eq!(reading.coordinates, Some(Coordinates::new(48.86, 2.35)));
}

#[tokio::test]
async fn error_keeps_last_position() {
    let watcher = ScriptedWatcher::default();
    let provider = LocationProvider::start(NoLookup, &watcher, WatchOptions::default());

    watcher.emit(PositionEvent::Position(Coordinates::new(50.63, 3.06)));
    watcher.emit(PositionEvent::Error(PositionError::permission_denied("denied")));
    settle().await;

    let reading = provider.current_reading();
    assert_eq!(reading.coordinates, Some(Coordinates::new(50.63, 3.06)));
    assert_eq!(
        reading.error.as_ref().map(|e| e.kind),
        Some(PositionErrorKind::PermissionDenied)
    );
}

#[tokio::test]
async fn shutdown_twice_and_no_updates_after() {
    let watcher = ScriptedWatcher::default();
    let provider = LocationProvider::start(NoLookup, &watcher, WatchOptions::default());
    assert!(provider.is_tracking());

    provider.shutdown();
    provider.shutdown();
    assert!(!provider.is_tracking());

    watcher.emit(PositionEvent::Position(Coordinates::new(1.0, 1.0)));
    settle().await;
    assert!(!provider.current_reading().has_position());
}

#[test]
fn initial_view_follows_precision_tier() {
    let cases = [
        (Precision::City, 13.0),
        (Precision::Country, 6.0),
        (Precision::Precise, 15.0),
    ];
    for (precision, zoom) in cases {
        let provider = LocationProvider::fixed(LocationReading {
            coordinates: Some(Coordinates::new(45.0, 5.0)),
            precision,
            ..Default::default()
        });
        let view = MapView::new(ModuleRegistry::new(), &provider, MapViewOptions::default());
        let state = view.initial_view_state();
        assert_eq!(state.zoom, zoom);
        assert_eq!(state.center(), Coordinates::new(45.0, 5.0));
        assert_eq!(state.pitch, 25.0);
        assert_eq!(state.bearing, 0.0);
    }

    let provider = LocationProvider::fixed(LocationReading::default());
    let view = MapView::new(ModuleRegistry::new(), &provider, MapViewOptions::default());
    assert_eq!(view.initial_view_state().center(), FRANCE_CENTER);
    assert_eq!(view.initial_view_state().zoom, 6.0);
}

fn props(color: &str) -> ExtraProps {
    ExtraProps::from([("color".to_string(), serde_json::json!(color))])
}

fn text(value: &'static str) -> Renderer {
    Renderer::props(move |_| RenderNode::Text(value.to_string()))
}

#[test]
fn modules_compose_in_registration_order() {
    let registry = ModuleRegistry::new();
    let a = registry.register_module("a", text("first"), None);
    let b = registry.register_module("b", text("second"), None);

    assert_ne!(a.id(), b.id());
    let composed = registry.compose(&MapRef::new());
    let keys: Vec<_> = composed.iter().map(|m| m.key.as_str().to_string()).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(composed[0].node, RenderNode::Text("first".to_string()));
}

#[test]
fn deactivate_and_reactivate_keeps_id() {
    let registry = ModuleRegistry::new();
    let mut slot = registry.register_module("overlay", text("x"), Some(props("red")));
    let id = slot.id();

    slot.deactivate();
    assert!(registry.is_empty());

    slot.sync("overlay", text("x"), Some(props("blue")));
    assert_eq!(registry.len(), 1);
    assert_eq!(slot.id(), id);

    let id = id.unwrap();
    assert_eq!(registry.extra_props(&id), Some(props("blue")));
}

#[test]
fn dropping_slot_deregisters() {
    let registry = ModuleRegistry::new();
    let keep = registry.register_module("keep", text("k"), None);
    {
        let _gone = registry.register_module("gone", text("g"), None);
        assert_eq!(registry.len(), 2);
    }

    let modules = registry.modules();
    assert_eq!(modules.len(), 1);
    assert_eq!(Some(modules[0].id), keep.id());
}

#[test]
fn deregistration_drops_props_too() {
    let registry = ModuleRegistry::new();
    let mut slot = registry.register_module("styled", text("s"), Some(props("green")));
    let id = slot.id().unwrap();

    slot.deactivate();
    assert!(!registry.contains(&id));
    assert_eq!(registry.extra_props(&id), None);
}

#[tokio::test]
async fn cancelling_watch_twice_is_harmless() {
    let flag = Arc::new(AtomicBool::new(true));
    let task = tokio::spawn(std::future::pending::<()>());
    let mut handle = WatchHandle::new(Arc::clone(&flag), task);

    assert!(handle.cancel());
    assert!(!handle.cancel());
    assert!(!handle.is_active());
}
