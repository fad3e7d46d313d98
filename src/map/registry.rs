// src/map/registry.rs
//! Ordered, ownership-tracked registry of map overlay modules

use super::handle::MapRef;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{Arc, PoisonError, RwLock},
};
use uuid::Uuid;

/// Per-module configuration, replaced wholesale on change
pub type ExtraProps = BTreeMap<String, serde_json::Value>;

/// Registry-assigned module identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(Uuid);

impl ModuleId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Caller-supplied stable identity of a module's renderer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleKey(String);

impl ModuleKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ModuleKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a module renders; the registry does not look inside
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Empty,
    Text(String),
    Marker {
        latitude: f64,
        longitude: f64,
        label: Option<String>,
    },
    Group(Vec<RenderNode>),
}

type MapRenderFn = dyn Fn(&MapRef) -> RenderNode + Send + Sync;
type MapPropsRenderFn = dyn Fn(&MapRef, &ExtraProps) -> RenderNode + Send + Sync;
type PropsRenderFn = dyn Fn(&ExtraProps) -> RenderNode + Send + Sync;

/// Module render function, by what it consumes
#[derive(Clone)]
pub enum Renderer {
    /// Needs only the shared map handle
    Map(Arc<MapRenderFn>),
    /// Needs the map handle plus its own props
    MapWithProps(Arc<MapPropsRenderFn>),
    /// Needs only its own props
    Props(Arc<PropsRenderFn>),
}

impl Renderer {
    pub fn map(f: impl Fn(&MapRef) -> RenderNode + Send + Sync + 'static) -> Self {
        Renderer::Map(Arc::new(f))
    }

    pub fn map_with_props(f: impl Fn(&MapRef, &ExtraProps) -> RenderNode + Send + Sync + 'static) -> Self {
        Renderer::MapWithProps(Arc::new(f))
    }

    pub fn props(f: impl Fn(&ExtraProps) -> RenderNode + Send + Sync + 'static) -> Self {
        Renderer::Props(Arc::new(f))
    }

    pub fn render(&self, map: &MapRef, props: &ExtraProps) -> RenderNode {
        match self {
            Renderer::Map(f) => f(map),
            Renderer::MapWithProps(f) => f(map, props),
            Renderer::Props(f) => f(props),
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Renderer::Map(_) => "Map",
            Renderer::MapWithProps(_) => "MapWithProps",
            Renderer::Props(_) => "Props",
        };
        write!(f, "Renderer::{}", kind)
    }
}

/// One registered module, in registration order
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    pub id: ModuleId,
    pub key: ModuleKey,
    pub renderer: Renderer,
}

/// Output of composing one module against the map
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedModule {
    pub id: ModuleId,
    pub key: ModuleKey,
    pub node: RenderNode,
}

/// Sequence and props live behind one lock so readers never see one without the other
#[derive(Default)]
struct RegistryState {
    modules: Vec<ModuleEntry>,
    extra_props: HashMap<ModuleId, ExtraProps>,
}

/// Registry of overlay modules attached to the shared map.
///
/// Clones share the same state. Mutation only happens through [`ModuleSlot`].
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module for as long as the returned slot stays active
    pub fn register_module(
        &self,
        key: impl Into<ModuleKey>,
        renderer: Renderer,
        extra_props: Option<ExtraProps>,
    ) -> ModuleSlot {
        let mut slot = self.slot();
        slot.sync(key, renderer, extra_props);
        slot
    }

    /// Empty slot, activated by its first [`ModuleSlot::sync`]
    pub fn slot(&self) -> ModuleSlot {
        ModuleSlot {
            registry: self.clone(),
            identity: None,
            props: None,
            active: false,
        }
    }

    /// Snapshot of the module sequence
    pub fn modules(&self) -> Vec<ModuleEntry> {
        self.read(|state| state.modules.clone())
    }

    pub fn extra_props(&self, id: &ModuleId) -> Option<ExtraProps> {
        self.read(|state| state.extra_props.get(id).cloned())
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.read(|state| state.modules.iter().any(|m| m.id == *id))
    }

    pub fn len(&self) -> usize {
        self.read(|state| state.modules.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render every module in sequence order with the map handle and its props
    pub fn compose(&self, map: &MapRef) -> Vec<ComposedModule> {
        let snapshot: Vec<(ModuleEntry, ExtraProps)> = self.read(|state| {
            state
                .modules
                .iter()
                .map(|entry| {
                    let props = state.extra_props.get(&entry.id).cloned().unwrap_or_default();
                    (entry.clone(), props)
                })
                .collect()
        });

        // Renderers run outside the lock so they may read the registry themselves
        snapshot
            .into_iter()
            .map(|(entry, props)| ComposedModule {
                node: entry.renderer.render(map, &props),
                id: entry.id,
                key: entry.key,
            })
            .collect()
    }

    fn read<R>(&self, f: impl FnOnce(&RegistryState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut RegistryState) -> R) -> R {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Append `entry` (or refresh its renderer in place), replacing its props when given
    fn upsert(&self, entry: ModuleEntry, props: Option<ExtraProps>) {
        self.write(|state| {
            let id = entry.id;
            match state.modules.iter_mut().find(|m| m.id == id) {
                Some(existing) => existing.renderer = entry.renderer,
                None => state.modules.push(entry),
            }
            if let Some(props) = props {
                state.extra_props.insert(id, props);
            }
        });
    }

    /// Remove the first entry with `id` together with its props
    fn remove(&self, id: &ModuleId) -> bool {
        self.write(|state| {
            let removed = match state.modules.iter().position(|m| m.id == *id) {
                Some(index) => {
                    state.modules.remove(index);
                    true
                }
                None => false,
            };
            state.extra_props.remove(id);
            removed
        })
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|state| {
            f.debug_struct("ModuleRegistry")
                .field("modules", &state.modules)
                .field("extra_props", &state.extra_props)
                .finish()
        })
    }
}

/// A consumer's registration, bound to its lifecycle.
///
/// `sync` is called on every (re)activation with the consumer's current key,
/// renderer and props; `deactivate` (or drop) removes the module.
pub struct ModuleSlot {
    registry: ModuleRegistry,
    identity: Option<(ModuleId, ModuleKey)>,
    props: Option<ExtraProps>,
    active: bool,
}

impl ModuleSlot {
    /// Bring the registration in line with the consumer's current state.
    ///
    /// The id is kept while `key` stays the same, including across
    /// deactivate/sync cycles. A different key registers a new module in
    /// place of the old one. Props are replaced only when their values change.
    pub fn sync(&mut self, key: impl Into<ModuleKey>, renderer: Renderer, extra_props: Option<ExtraProps>) {
        let key = key.into();
        let props = extra_props.unwrap_or_default();

        let id = match &self.identity {
            Some((id, current)) if *current == key => *id,
            _ => {
                self.deactivate();
                let id = ModuleId::generate();
                debug!("Registering module {} as {}", key, id);
                self.identity = Some((id, key.clone()));
                self.props = None;
                id
            }
        };

        let refresh_props = !self.active || self.props.as_ref() != Some(&props);
        if self.active && refresh_props {
            debug!("Module {} props updated", id);
        }
        self.registry
            .upsert(ModuleEntry { id, key, renderer }, refresh_props.then(|| props.clone()));
        self.active = true;
        self.props = Some(props);
    }

    /// Remove the module and its props. No-op when already inactive.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some((id, key)) = &self.identity {
            if self.registry.remove(id) {
                debug!("Module {} ({}) unregistered", key, id);
            }
        }
    }

    pub fn id(&self) -> Option<ModuleId> {
        self.identity.as_ref().map(|(id, _)| *id)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for ModuleSlot {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl fmt::Debug for ModuleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSlot")
            .field("identity", &self.identity)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(pairs: &[(&str, serde_json::Value)]) -> ExtraProps {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn label_renderer() -> Renderer {
        Renderer::props(|props| match props.get("label").and_then(|v| v.as_str()) {
            Some(label) => RenderNode::Text(label.to_string()),
            None => RenderNode::Empty,
        })
    }

    #[test]
    fn test_distinct_modules_keep_order() {
        let registry = ModuleRegistry::new();
        let first = registry.register_module("first", label_renderer(), Some(props(&[("label", json!("a"))])));
        let second = registry.register_module("second", label_renderer(), Some(props(&[("label", json!("b"))])));

        assert_ne!(first.id(), second.id());

        let composed = registry.compose(&MapRef::new());
        let nodes: Vec<_> = composed.iter().map(|m| m.node.clone()).collect();
        assert_eq!(
            nodes,
            vec![RenderNode::Text("a".to_string()), RenderNode::Text("b".to_string())]
        );
        assert_eq!(composed[0].key.as_str(), "first");
    }

    #[test]
    fn test_props_replaced_on_change() {
        let registry = ModuleRegistry::new();
        let mut slot = registry.register_module("marker", label_renderer(), Some(props(&[("label", json!("old"))])));
        let id = slot.id().unwrap();

        slot.sync("marker", label_renderer(), Some(props(&[("label", json!("new"))])));

        assert_eq!(slot.id(), Some(id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.extra_props(&id), Some(props(&[("label", json!("new"))])));
    }

    #[test]
    fn test_missing_props_mean_empty_config() {
        let registry = ModuleRegistry::new();
        let slot = registry.register_module("bare", label_renderer(), None);

        assert_eq!(registry.extra_props(&slot.id().unwrap()), Some(ExtraProps::new()));
        assert_eq!(registry.compose(&MapRef::new())[0].node, RenderNode::Empty);
    }

    #[test]
    fn test_key_change_registers_new_module() {
        let registry = ModuleRegistry::new();
        let mut slot = registry.register_module("v1", label_renderer(), None);
        let _other = registry.register_module("other", label_renderer(), None);
        let old_id = slot.id().unwrap();

        slot.sync("v2", label_renderer(), None);
        let new_id = slot.id().unwrap();

        assert_ne!(old_id, new_id);
        assert!(!registry.contains(&old_id));
        assert!(registry.extra_props(&old_id).is_none());

        let keys: Vec<_> = registry.modules().iter().map(|m| m.key.to_string()).collect();
        assert_eq!(keys, vec!["other", "v2"]);
    }

    #[test]
    fn test_reactivation_keeps_single_entry_with_latest_props() {
        let registry = ModuleRegistry::new();
        let mut slot = registry.register_module("layer", label_renderer(), Some(props(&[("label", json!(1))])));
        let id = slot.id().unwrap();

        slot.deactivate();
        assert!(registry.is_empty());

        slot.sync("layer", label_renderer(), Some(props(&[("label", json!(2))])));

        assert_eq!(registry.len(), 1);
        assert_eq!(slot.id(), Some(id));
        assert_eq!(registry.extra_props(&id), Some(props(&[("label", json!(2))])));
    }

    #[test]
    fn test_deregister_removes_entry_and_props() {
        let registry = ModuleRegistry::new();
        let mut slot = registry.register_module("gone", label_renderer(), Some(props(&[("x", json!(true))])));
        let id = slot.id().unwrap();

        slot.deactivate();
        slot.deactivate();

        assert!(!registry.contains(&id));
        assert!(registry.extra_props(&id).is_none());
        assert!(!slot.is_active());
    }

    #[test]
    fn test_drop_deregisters() {
        let registry = ModuleRegistry::new();
        {
            let _slot = registry.register_module("scoped", label_renderer(), None);
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rapid_toggling_does_not_leak() {
        let registry = ModuleRegistry::new();
        let mut slot = registry.slot();

        for round in 0..49 {
            slot.sync("toggle", label_renderer(), Some(props(&[("round", json!(round))])));
            if round % 3 != 0 {
                slot.deactivate();
            }
        }

        let modules = registry.modules();
        assert_eq!(modules.len(), 1);
        assert_eq!(
            registry.extra_props(&modules[0].id),
            Some(props(&[("round", json!(48))]))
        );
        drop(slot);
        assert!(registry.is_empty());
        assert!(registry.read(|state| state.extra_props.is_empty()));
    }

    #[test]
    fn test_renderer_may_read_registry() {
        let registry = ModuleRegistry::new();
        let inner = registry.clone();
        let _slot = registry.register_module(
            "count",
            Renderer::map(move |_| RenderNode::Text(format!("{} modules", inner.len()))),
            None,
        );

        let composed = registry.compose(&MapRef::new());
        assert_eq!(composed[0].node, RenderNode::Text("1 modules".to_string()));
    }
}
