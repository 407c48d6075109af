//! Non-fatal diagnostics.
//!
//! Everything reported here is recoverable: the runtime keeps going and the
//! report is routed to the tree's warn handler, or to `tracing` when none is
//! installed. Production mode and `silent` drop reports entirely.

use super::util::{classify, hyphenate};
use crate::models::{ComponentTree, InstanceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnresolvedInjection { key: String },
    InjectedMutation { key: String },
    /// `emitted` has uppercase letters while a handler is registered under
    /// its lowercase form.
    EventCasing { emitted: String, registered: String },
    InvalidHandler { event: String },
}

impl Diagnostic {
    pub fn message(&self, component: &str) -> String {
        match self {
            Diagnostic::UnresolvedInjection { key } => format!("Injection \"{}\" not found", key),
            Diagnostic::InjectedMutation { key } => format!(
                "Avoid mutating an injected value directly since the changes will be \
                 overwritten whenever the provided component re-renders. \
                 injection being mutated: \"{}\"",
                key
            ),
            Diagnostic::EventCasing {
                emitted,
                registered,
            } => format!(
                "Event \"{}\" is emitted in component {} but the handler is registered for \"{}\". \
                 Note that HTML attributes are case-insensitive and you cannot use \
                 v-on to listen to camelCase events when using in-DOM templates. \
                 You should probably use \"{}\" instead of \"{}\".",
                emitted,
                component,
                registered,
                hyphenate(emitted),
                emitted
            ),
            Diagnostic::InvalidHandler { event } => {
                format!("Invalid handler for event \"{}\": got no handlers", event)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    pub diagnostic: Diagnostic,
    pub instance: InstanceId,
    pub message: String,
    pub trace: String,
}

impl ComponentTree {
    pub(crate) fn report(&self, id: InstanceId, diagnostic: Diagnostic) {
        let config = self.config();
        if !config.is_development() || config.silent {
            return;
        }

        let component = self.format_component_name(id);
        let report = DiagnosticReport {
            message: diagnostic.message(&component),
            trace: self.component_trace(id),
            instance: id,
            diagnostic,
        };

        match self.warn_handler() {
            Some(handler) => handler(&report),
            None => tracing::warn!(
                instance = ?report.instance,
                trace = %report.trace,
                "{}",
                report.message
            ),
        }
    }

    /// `<Root>` for a parentless instance, otherwise `<Name>` or `<Anonymous>`.
    pub fn format_component_name(&self, id: InstanceId) -> String {
        if !self.contains(id) {
            return "<Anonymous>".to_string();
        }
        if self.parent(id).is_none() {
            return "<Root>".to_string();
        }
        match self.name(id) {
            Some(name) if !name.is_empty() => format!("<{}>", classify(name)),
            _ => "<Anonymous>".to_string(),
        }
    }

    pub fn component_trace(&self, id: InstanceId) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut current = self.contains(id).then_some(id);
        while let Some(cur) = current {
            let indent = if lines.is_empty() {
                "---> ".to_string()
            } else {
                " ".repeat(5 + lines.len() * 2)
            };
            lines.push(format!("{}{}", indent, self.format_component_name(cur)));
            current = self.parent(cur);
        }

        if lines.is_empty() {
            return String::new();
        }
        format!("found in\n\n{}", lines.join("\n"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/diagnostics.rs"]
mod tests;
