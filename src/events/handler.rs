use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::core::HandlerError;
use crate::models::{ComponentTree, InstanceId};

/// Callback signature. The handler receives the tree and the emitting
/// instance, so it can re-enter `on`/`off`/`emit` on the bus it runs on.
pub type HandlerFn = dyn Fn(&mut ComponentTree, InstanceId, &[Value]) -> Result<(), HandlerError>;

enum Kind {
    Plain(Box<HandlerFn>),
    Once { event: String, original: Handler },
    Invoker {
        event: String,
        fns: RefCell<Vec<Handler>>,
    },
}

/// Reference-counted event handler. Two handlers are the same handler iff
/// they share the allocation.
#[derive(Clone)]
pub struct Handler(Rc<Kind>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ComponentTree, InstanceId, &[Value]) -> Result<(), HandlerError> + 'static,
    {
        Self(Rc::new(Kind::Plain(Box::new(f))))
    }

    /// Wraps `original` so that the first call removes the wrapper from
    /// `event` on the calling instance before running `original`.
    pub fn once(event: &str, original: Handler) -> Self {
        Self(Rc::new(Kind::Once {
            event: event.to_string(),
            original,
        }))
    }

    /// A handler whose callback list can be swapped in place, so a changed
    /// listener binding does not need a remove/add round trip. Each callback
    /// runs behind the error boundary on its own.
    pub fn invoker(event: &str, fns: Vec<Handler>) -> Self {
        Self(Rc::new(Kind::Invoker {
            event: event.to_string(),
            fns: RefCell::new(fns),
        }))
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The wrapped handler of a once wrapper.
    pub fn original(&self) -> Option<&Handler> {
        match &*self.0 {
            Kind::Once { original, .. } => Some(original),
            _ => None,
        }
    }

    pub fn is_once(&self) -> bool {
        matches!(&*self.0, Kind::Once { .. })
    }

    /// Identity match used by `off`: either this handler or the original it wraps.
    pub fn matches(&self, other: &Handler) -> bool {
        self.ptr_eq(other) || self.original().is_some_and(|o| o.ptr_eq(other))
    }

    pub fn fns(&self) -> Option<Vec<Handler>> {
        match &*self.0 {
            Kind::Invoker { fns, .. } => Some(fns.borrow().clone()),
            _ => None,
        }
    }

    /// Returns false when this handler is not an invoker.
    pub fn set_fns(&self, new_fns: Vec<Handler>) -> bool {
        match &*self.0 {
            Kind::Invoker { fns, .. } => {
                *fns.borrow_mut() = new_fns;
                true
            }
            _ => false,
        }
    }

    pub fn call(
        &self,
        tree: &mut ComponentTree,
        target: InstanceId,
        args: &[Value],
    ) -> Result<(), HandlerError> {
        match &*self.0 {
            Kind::Plain(f) => f(tree, target, args),
            Kind::Once { event, original } => {
                tree.off(target, event.as_str(), Some(self));
                original.call(tree, target, args)
            }
            Kind::Invoker { event, fns } => {
                // Snapshot: a callback may swap the list while we iterate.
                let fns = fns.borrow().clone();
                let info = format!("event handler for \"{}\"", event);
                for f in &fns {
                    tree.invoke_with_error_handling(f, target, args, event, &info);
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.0 {
            Kind::Plain(_) => "plain",
            Kind::Once { .. } => "once",
            Kind::Invoker { .. } => "invoker",
        };
        write!(f, "Handler({}@{:p})", kind, Rc::as_ptr(&self.0))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/events/handler.rs"]
mod tests;
