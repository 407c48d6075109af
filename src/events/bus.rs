//! Per-instance event bus.
//!
//! Storage lives in [`EventBus`], one per instance. The public operations
//! (`on`, `once`, `off`, `emit`) are on [`ComponentTree`] because handlers
//! need the whole tree to re-enter the bus.

use std::panic::{self, AssertUnwindSafe};

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::handler::Handler;
use crate::core::{Diagnostic, HandlerError, HandlerFailure};
use crate::models::{ComponentTree, InstanceId};

/// Event names starting with this prefix are lifecycle hook events.
pub const HOOK_PREFIX: &str = "hook:";

/// One name or a list of names, each getting the same treatment.
#[derive(Clone, Copy, Debug)]
pub enum EventNames<'a> {
    One(&'a str),
    Many(&'a [&'a str]),
}

impl<'a> EventNames<'a> {
    pub fn as_slice(&self) -> &[&'a str] {
        match self {
            EventNames::One(event) => std::slice::from_ref(event),
            EventNames::Many(events) => events,
        }
    }
}

impl<'a> From<&'a str> for EventNames<'a> {
    fn from(event: &'a str) -> Self {
        EventNames::One(event)
    }
}

impl<'a> From<&'a String> for EventNames<'a> {
    fn from(event: &'a String) -> Self {
        EventNames::One(event.as_str())
    }
}

impl<'a> From<&'a [&'a str]> for EventNames<'a> {
    fn from(events: &'a [&'a str]) -> Self {
        EventNames::Many(events)
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for EventNames<'a> {
    fn from(events: &'a [&'a str; N]) -> Self {
        EventNames::Many(events.as_slice())
    }
}

/// Event name -> handlers in registration order.
///
/// A name cleared with `off(name)` keeps its key with a `None` marker;
/// emitting it is a no-op just like a name that was never registered.
#[derive(Debug, Default)]
pub struct EventBus {
    events: FxHashMap<CompactString, Option<Vec<Handler>>>,
    has_hook_event: bool,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: &str, handler: Handler) {
        self.events
            .entry(CompactString::new(event))
            .or_insert(None)
            .get_or_insert_with(Vec::new)
            .push(handler);
        // Set on registration, never cleared on removal.
        if event.starts_with(HOOK_PREFIX) {
            self.has_hook_event = true;
        }
    }

    /// Removes the last entry matching `handler` (or wrapping it). Only one
    /// entry goes even if the handler was registered more than once.
    pub fn remove(&mut self, event: &str, handler: &Handler) -> bool {
        let Some(Some(cbs)) = self.events.get_mut(event) else {
            return false;
        };
        match cbs.iter().rposition(|cb| cb.matches(handler)) {
            Some(pos) => {
                cbs.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn clear_event(&mut self, event: &str) {
        if let Some(slot) = self.events.get_mut(event) {
            *slot = None;
        }
    }

    pub fn clear(&mut self) {
        self.events = FxHashMap::default();
    }

    pub fn handlers(&self, event: &str) -> Option<&[Handler]> {
        self.events.get(event).and_then(|slot| slot.as_deref())
    }

    pub fn snapshot(&self, event: &str) -> Vec<Handler> {
        self.handlers(event).map(<[Handler]>::to_vec).unwrap_or_default()
    }

    /// The name has a live handler list (possibly empty), not the cleared marker.
    pub fn is_registered(&self, event: &str) -> bool {
        self.handlers(event).is_some()
    }

    /// The name has a key at all, cleared or not.
    pub fn contains_event(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(CompactString::as_str)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.handlers(event).map_or(0, <[Handler]>::len)
    }

    pub fn has_hook_event(&self) -> bool {
        self.has_hook_event
    }
}

impl ComponentTree {
    pub fn on<'a>(
        &mut self,
        id: InstanceId,
        events: impl Into<EventNames<'a>>,
        handler: Handler,
    ) -> &mut Self {
        let events = events.into();
        if let Some(instance) = self.instance_mut(id) {
            for event in events.as_slice() {
                instance.events.add(event, handler.clone());
            }
        } else {
            tracing::debug!(instance = ?id, ?events, "on: instance not found");
        }
        self
    }

    pub fn once(&mut self, id: InstanceId, event: &str, handler: Handler) -> &mut Self {
        self.on(id, event, Handler::once(event, handler))
    }

    /// `handler == None` clears every named event; otherwise only the last
    /// matching entry under each name is removed.
    pub fn off<'a>(
        &mut self,
        id: InstanceId,
        events: impl Into<EventNames<'a>>,
        handler: Option<&Handler>,
    ) -> &mut Self {
        let events = events.into();
        if let Some(instance) = self.instance_mut(id) {
            for event in events.as_slice() {
                match handler {
                    Some(handler) => {
                        instance.events.remove(event, handler);
                    }
                    None => instance.events.clear_event(event),
                }
            }
        }
        self
    }

    pub fn off_all(&mut self, id: InstanceId) -> &mut Self {
        if let Some(instance) = self.instance_mut(id) {
            instance.events.clear();
        }
        self
    }

    /// Runs a snapshot of the handlers registered for `event`, in order.
    /// Handler failures go to the error boundary and never reach the caller.
    pub fn emit(&mut self, id: InstanceId, event: &str, args: &[Value]) -> &mut Self {
        let Some(instance) = self.instance(id) else {
            tracing::debug!(instance = ?id, event, "emit: instance not found");
            return self;
        };

        if self.config().is_development() {
            let lower = event.to_lowercase();
            if lower != event && instance.events.is_registered(&lower) {
                self.report(
                    id,
                    Diagnostic::EventCasing {
                        emitted: event.to_string(),
                        registered: lower,
                    },
                );
            }
        }

        let cbs = instance.events.snapshot(event);
        if cbs.is_empty() {
            return self;
        }

        let info = format!("event handler for \"{}\"", event);
        for handler in &cbs {
            self.invoke_with_error_handling(handler, id, args, event, &info);
        }
        self
    }

    pub(crate) fn invoke_with_error_handling(
        &mut self,
        handler: &Handler,
        id: InstanceId,
        args: &[Value],
        event: &str,
        info: &str,
    ) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.call(self, id, args)));
        let error = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(payload) => HandlerError::Panicked(panic_message(payload.as_ref())),
        };

        self.handle_error(HandlerFailure {
            instance: id,
            event: event.to_string(),
            info: info.to_string(),
            error,
        });
    }

    pub(crate) fn handle_error(&self, failure: HandlerFailure) {
        match self.error_handler() {
            Some(handler) => handler(&failure),
            None => tracing::error!(
                instance = ?failure.instance,
                event = %failure.event,
                error = %failure.error,
                "Error in {}",
                failure.info
            ),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/events/bus.rs"]
mod tests;
