//! Arena of component instances.
//!
//! Instances own their children by id; `parent` is a plain handle, so the
//! tree has no ownership cycles.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use slotmap::{new_key_type, SlotMap};

use crate::core::{ComponentError, DiagnosticReport, HandlerFailure, Result, RuntimeConfig};
use crate::events::{EventBus, ListenerMap, HOOK_PREFIX};
use crate::inject::{InjectOptions, InjectedField, ProvideConfig};

new_key_type! { pub struct InstanceId; }

pub type WarnHandler = Rc<dyn Fn(&DiagnosticReport)>;
pub type ErrorHandler = Rc<dyn Fn(&HandlerFailure)>;

#[derive(Debug)]
pub struct Instance {
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) children: Vec<InstanceId>,
    pub(crate) events: EventBus,
    pub(crate) provided: Option<Map<String, Value>>,
    pub(crate) injected: FxHashMap<String, InjectedField>,
    pub(crate) parent_listeners: ListenerMap,
}

impl Instance {
    fn new(name: Option<String>, parent: Option<InstanceId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            events: EventBus::new(),
            provided: None,
            injected: FxHashMap::default(),
            parent_listeners: ListenerMap::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn provided(&self) -> Option<&Map<String, Value>> {
        self.provided.as_ref()
    }

    pub fn parent_listeners(&self) -> &ListenerMap {
        &self.parent_listeners
    }
}

/// What the construction pipeline needs to build one instance.
#[derive(Default)]
pub struct ComponentOptions {
    pub name: Option<String>,
    pub inject: Option<InjectOptions>,
    pub provide: Option<ProvideConfig>,
    pub parent_listeners: Option<ListenerMap>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_inject(mut self, inject: InjectOptions) -> Self {
        self.inject = Some(inject);
        self
    }

    pub fn with_provide(mut self, provide: ProvideConfig) -> Self {
        self.provide = Some(provide);
        self
    }

    pub fn with_listeners(mut self, listeners: ListenerMap) -> Self {
        self.parent_listeners = Some(listeners);
        self
    }
}

pub struct ComponentTree {
    arena: SlotMap<InstanceId, Instance>,
    config: RuntimeConfig,
    observing: bool,
    warn_handler: Option<WarnHandler>,
    error_handler: Option<ErrorHandler>,
}

impl ComponentTree {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            arena: SlotMap::with_key(),
            config,
            observing: true,
            warn_handler: None,
            error_handler: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn set_warn_handler(&mut self, handler: impl Fn(&DiagnosticReport) + 'static) {
        self.warn_handler = Some(Rc::new(handler));
    }

    pub fn set_error_handler(&mut self, handler: impl Fn(&HandlerFailure) + 'static) {
        self.error_handler = Some(Rc::new(handler));
    }

    pub(crate) fn warn_handler(&self) -> Option<&WarnHandler> {
        self.warn_handler.as_ref()
    }

    pub(crate) fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    /// Whether newly installed fields would be deeply observed.
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    pub(crate) fn set_observing(&mut self, observing: bool) {
        self.observing = observing;
    }

    /// Builds an instance under `parent`: injections, then provide, then
    /// the parent's listeners, then the `created` hook.
    pub fn create(
        &mut self,
        parent: Option<InstanceId>,
        options: ComponentOptions,
    ) -> Result<InstanceId> {
        if let Some(parent) = parent {
            if !self.arena.contains_key(parent) {
                return Err(ComponentError::InvalidInstance);
            }
        }

        let ComponentOptions {
            name,
            inject,
            provide,
            parent_listeners,
        } = options;

        let id = self.arena.insert(Instance::new(name, parent));
        if let Some(parent_node) = parent.and_then(|p| self.arena.get_mut(p)) {
            parent_node.children.push(id);
        }

        if let Some(inject) = &inject {
            self.init_injections(id, inject);
        }

        if let Some(provide) = &provide {
            if let Err(err) = self.init_provide(id, provide) {
                self.detach(id);
                self.arena.remove(id);
                return Err(err);
            }
        }

        if let Some(listeners) = parent_listeners {
            self.update_parent_listeners(id, listeners);
        }

        self.call_hook(id, "created");
        tracing::debug!(instance = ?id, parent = ?parent, "instance created");
        Ok(id)
    }

    /// Emits `hook:<hook>`; skipped entirely unless a hook listener was
    /// ever registered on the instance.
    pub fn call_hook(&mut self, id: InstanceId, hook: &str) {
        if self.has_hook_event(id) {
            let event = format!("{}{}", HOOK_PREFIX, hook);
            self.emit(id, &event, &[]);
        }
    }

    /// Tears down `id` and its subtree, children first.
    pub fn destroy(&mut self, id: InstanceId) {
        if !self.arena.contains_key(id) {
            return;
        }
        self.call_hook(id, "beforeDestroy");
        // A hook handler may already have destroyed it.
        if !self.arena.contains_key(id) {
            return;
        }

        self.detach(id);
        let children = self
            .arena
            .get(id)
            .map(|i| i.children.clone())
            .unwrap_or_default();
        for child in children {
            self.destroy(child);
        }

        self.call_hook(id, "destroyed");
        self.off_all(id);
        self.arena.remove(id);
        tracing::debug!(instance = ?id, "instance destroyed");
    }

    fn detach(&mut self, id: InstanceId) {
        let parent = self.arena.get(id).and_then(|i| i.parent);
        if let Some(parent_node) = parent.and_then(|p| self.arena.get_mut(p)) {
            parent_node.children.retain(|&c| c != id);
        }
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.arena.get(id)
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.arena.get_mut(id)
    }

    pub fn parent(&self, id: InstanceId) -> Option<InstanceId> {
        self.arena.get(id).and_then(|i| i.parent)
    }

    pub fn children(&self, id: InstanceId) -> &[InstanceId] {
        self.arena
            .get(id)
            .map(|i| i.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn name(&self, id: InstanceId) -> Option<&str> {
        self.arena.get(id).and_then(|i| i.name.as_deref())
    }

    pub fn root_of(&self, id: InstanceId) -> Option<InstanceId> {
        let mut current = self.arena.contains_key(id).then_some(id)?;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    pub fn provided(&self, id: InstanceId) -> Option<&Map<String, Value>> {
        self.arena.get(id).and_then(|i| i.provided.as_ref())
    }

    pub fn has_hook_event(&self, id: InstanceId) -> bool {
        self.arena
            .get(id)
            .is_some_and(|i| i.events.has_hook_event())
    }

    pub fn listener_count(&self, id: InstanceId, event: &str) -> usize {
        self.arena
            .get(id)
            .map_or(0, |i| i.events.listener_count(event))
    }
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/instance_tree.rs"]
mod tests;
