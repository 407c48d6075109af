use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::core::Diagnostic;
use crate::models::{ComponentTree, InstanceId};

pub type DefaultFn = dyn Fn(&ComponentTree, InstanceId) -> Value;

#[derive(Clone)]
pub enum InjectDefault {
    Value(Value),
    /// Called with the injecting instance.
    Factory(Rc<DefaultFn>),
}

impl InjectDefault {
    fn materialize(&self, tree: &ComponentTree, id: InstanceId) -> Value {
        match self {
            InjectDefault::Value(value) => value.clone(),
            InjectDefault::Factory(factory) => factory(tree, id),
        }
    }
}

impl fmt::Debug for InjectDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            InjectDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InjectSpec {
    pub from: String,
    pub default: Option<InjectDefault>,
}

impl InjectSpec {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(InjectDefault::Value(value));
        self
    }

    pub fn with_default_factory<F>(mut self, f: F) -> Self
    where
        F: Fn(&ComponentTree, InstanceId) -> Value + 'static,
    {
        self.default = Some(InjectDefault::Factory(Rc::new(f)));
        self
    }
}

/// Local key -> where to find it, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct InjectOptions {
    entries: Vec<(String, InjectSpec)>,
}

impl InjectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, spec: InjectSpec) -> Self {
        self.entries.push((key.into(), spec));
        self
    }

    /// List form: each key is injected from the provider key of the same name.
    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let entries = keys
            .into_iter()
            .map(|k| {
                let key = k.into();
                let spec = InjectSpec::new(key.clone());
                (key, spec)
            })
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InjectSpec)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An injected value installed on an instance.
#[derive(Clone, Debug, PartialEq)]
pub struct InjectedField {
    pub(crate) value: Value,
    pub(crate) guarded: bool,
    pub(crate) observed: bool,
}

impl InjectedField {
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Writes report a misuse diagnostic.
    pub fn is_guarded(&self) -> bool {
        self.guarded
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }
}

/// Resolves every declared key against the nearest provider, starting at
/// `id` itself. Returns `None` only when no options are given.
pub fn resolve_inject(
    tree: &ComponentTree,
    options: Option<&InjectOptions>,
    id: InstanceId,
) -> Option<Map<String, Value>> {
    let options = options?;
    let mut result = Map::new();

    for (key, spec) in options.iter() {
        if let Some(value) = find_provided(tree, id, &spec.from) {
            result.insert(key.to_string(), value.clone());
            continue;
        }
        match &spec.default {
            Some(default) => {
                result.insert(key.to_string(), default.materialize(tree, id));
            }
            None => tree.report(
                id,
                Diagnostic::UnresolvedInjection {
                    key: key.to_string(),
                },
            ),
        }
    }

    Some(result)
}

fn find_provided<'t>(tree: &'t ComponentTree, id: InstanceId, from: &str) -> Option<&'t Value> {
    let mut source = Some(id);
    while let Some(current) = source {
        let instance = tree.instance(current)?;
        if let Some(value) = instance.provided().and_then(|p| p.get(from)) {
            return Some(value);
        }
        source = instance.parent();
    }
    None
}

impl ComponentTree {
    pub(crate) fn init_injections(&mut self, id: InstanceId, options: &InjectOptions) {
        let Some(result) = resolve_inject(self, Some(options), id) else {
            return;
        };

        let guarded = self.config().is_development();
        self.set_observing(false);
        for (key, value) in result {
            let field = InjectedField {
                value,
                guarded,
                observed: self.is_observing(),
            };
            if let Some(instance) = self.instance_mut(id) {
                instance.injected.insert(key, field);
            }
        }
        self.set_observing(true);
    }

    pub fn injected(&self, id: InstanceId, key: &str) -> Option<&Value> {
        self.injected_field(id, key).map(InjectedField::value)
    }

    pub fn injected_field(&self, id: InstanceId, key: &str) -> Option<&InjectedField> {
        self.instance(id).and_then(|i| i.injected.get(key))
    }

    /// Overwrites an injected field. Guarded fields report the mutation but
    /// are still written. Returns false if the field does not exist.
    pub fn set_injected(&mut self, id: InstanceId, key: &str, value: Value) -> bool {
        let Some(guarded) = self.injected_field(id, key).map(|f| f.guarded) else {
            return false;
        };
        if guarded {
            self.report(
                id,
                Diagnostic::InjectedMutation {
                    key: key.to_string(),
                },
            );
        }
        if let Some(field) = self
            .instance_mut(id)
            .and_then(|i| i.injected.get_mut(key))
        {
            field.value = value;
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/inject/resolve.rs"]
mod tests;
