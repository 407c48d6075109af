//! Listener reconciliation.
//!
//! Diffs two declarative listener maps and applies the minimal add/remove
//! calls through a [`ListenerOps`] target. The target is passed explicitly,
//! so nested reconciliations never share state.

use std::collections::BTreeMap;
use std::fmt;

use super::handler::Handler;
use crate::core::Diagnostic;
use crate::models::{ComponentTree, InstanceId};

/// Declared handlers for one event name, plus what ended up attached.
#[derive(Clone, Default)]
pub struct ListenerBinding {
    fns: Vec<Handler>,
    once: bool,
    invoker: Option<Handler>,
    attached: Option<Handler>,
}

impl ListenerBinding {
    pub fn new(handler: Handler) -> Self {
        Self::many(vec![handler])
    }

    pub fn many(fns: Vec<Handler>) -> Self {
        Self {
            fns,
            ..Self::default()
        }
    }

    /// Marks the binding as fire-once.
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn is_once(&self) -> bool {
        self.once
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.fns
    }

    /// The handler registered on the target after reconciliation.
    pub fn attached(&self) -> Option<&Handler> {
        self.attached.as_ref()
    }

    fn same_as(&self, other: &ListenerBinding) -> bool {
        self.once == other.once
            && self.fns.len() == other.fns.len()
            && self.fns.iter().zip(&other.fns).all(|(a, b)| a.ptr_eq(b))
    }

    fn carry_from(&mut self, prev: &ListenerBinding) {
        self.invoker = prev.invoker.clone();
        self.attached = prev.attached.clone();
    }
}

impl fmt::Debug for ListenerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerBinding")
            .field("fns", &self.fns)
            .field("once", &self.once)
            .field("attached", &self.attached)
            .finish()
    }
}

pub type ListenerMap = BTreeMap<String, ListenerBinding>;

/// The primitives reconciliation is written against.
pub trait ListenerOps {
    fn add(&mut self, event: &str, handler: Handler);
    fn remove(&mut self, event: &str, handler: &Handler);
    fn create_once(&mut self, event: &str, handler: Handler) -> Handler;

    fn invalid_handler(&mut self, event: &str) {
        tracing::warn!(event, "invalid handler: binding has no handlers");
    }
}

/// Brings `ops`' target from `old` to `new`. Attached handlers are recorded
/// in `new`, which becomes the `old` of the next call.
pub fn reconcile<O>(ops: &mut O, new: &mut ListenerMap, old: &ListenerMap)
where
    O: ListenerOps + ?Sized,
{
    for (event, cur) in new.iter_mut() {
        if cur.fns.is_empty() {
            ops.invalid_handler(event);
            continue;
        }

        let Some(prev) = old.get(event) else {
            attach(ops, event, cur);
            continue;
        };

        if prev.same_as(cur) {
            cur.carry_from(prev);
            continue;
        }

        match (&prev.invoker, &prev.attached) {
            (Some(invoker), Some(_)) if prev.once == cur.once => {
                invoker.set_fns(cur.fns.clone());
                cur.carry_from(prev);
            }
            (_, Some(attached)) => {
                ops.remove(event, attached);
                attach(ops, event, cur);
            }
            (_, None) => attach(ops, event, cur),
        }
    }

    for (event, prev) in old {
        let dropped = new.get(event).map_or(true, |cur| cur.fns.is_empty());
        if !dropped {
            continue;
        }
        if let Some(attached) = &prev.attached {
            ops.remove(event, attached);
        }
    }
}

fn attach<O>(ops: &mut O, event: &str, binding: &mut ListenerBinding)
where
    O: ListenerOps + ?Sized,
{
    let invoker = Handler::invoker(event, binding.fns.clone());
    let attached = if binding.once {
        ops.create_once(event, invoker.clone())
    } else {
        invoker.clone()
    };
    ops.add(event, attached.clone());
    binding.invoker = Some(invoker);
    binding.attached = Some(attached);
}

/// [`ListenerOps`] bound to one instance's event bus.
pub struct InstanceListeners<'a> {
    tree: &'a mut ComponentTree,
    target: InstanceId,
}

impl<'a> InstanceListeners<'a> {
    pub fn new(tree: &'a mut ComponentTree, target: InstanceId) -> Self {
        Self { tree, target }
    }
}

impl ListenerOps for InstanceListeners<'_> {
    fn add(&mut self, event: &str, handler: Handler) {
        self.tree.on(self.target, event, handler);
    }

    fn remove(&mut self, event: &str, handler: &Handler) {
        self.tree.off(self.target, event, Some(handler));
    }

    fn create_once(&mut self, event: &str, handler: Handler) -> Handler {
        Handler::once(event, handler)
    }

    fn invalid_handler(&mut self, event: &str) {
        self.tree.report(
            self.target,
            Diagnostic::InvalidHandler {
                event: event.to_string(),
            },
        );
    }
}

impl ComponentTree {
    pub fn update_component_listeners(
        &mut self,
        id: InstanceId,
        listeners: &mut ListenerMap,
        old_listeners: &ListenerMap,
    ) {
        reconcile(&mut InstanceListeners::new(self, id), listeners, old_listeners);
    }

    /// Diffs `listeners` against the ones the parent attached last time and
    /// keeps them for the next update.
    pub fn update_parent_listeners(&mut self, id: InstanceId, mut listeners: ListenerMap) {
        let Some(instance) = self.instance_mut(id) else {
            return;
        };
        let old = std::mem::take(&mut instance.parent_listeners);
        self.update_component_listeners(id, &mut listeners, &old);
        if let Some(instance) = self.instance_mut(id) {
            instance.parent_listeners = listeners;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/events/listeners.rs"]
mod tests;
