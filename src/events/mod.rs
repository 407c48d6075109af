//! Per-instance event bus and the listener reconciler that feeds it.

pub mod bus;
pub mod handler;
pub mod listeners;

pub use bus::{EventBus, EventNames, HOOK_PREFIX};
pub use handler::{Handler, HandlerFn};
pub use listeners::{reconcile, InstanceListeners, ListenerBinding, ListenerMap, ListenerOps};
