use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::core::{ComponentError, Result};
use crate::models::{ComponentTree, InstanceId};

pub type ProvideFn = dyn Fn(&ComponentTree, InstanceId) -> Result<Map<String, Value>>;

/// A fixed map, or a factory evaluated once with the providing instance.
#[derive(Clone)]
pub enum ProvideConfig {
    Static(Map<String, Value>),
    Factory(Rc<ProvideFn>),
}

impl ProvideConfig {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&ComponentTree, InstanceId) -> Result<Map<String, Value>> + 'static,
    {
        ProvideConfig::Factory(Rc::new(f))
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        ProvideConfig::Static(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Debug for ProvideConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvideConfig::Static(map) => f.debug_tuple("Static").field(map).finish(),
            ProvideConfig::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Factory errors are returned as-is; nothing here catches them.
pub fn compute_provided(
    tree: &ComponentTree,
    id: InstanceId,
    config: &ProvideConfig,
) -> Result<Map<String, Value>> {
    match config {
        ProvideConfig::Static(map) => Ok(map.clone()),
        ProvideConfig::Factory(factory) => factory(tree, id),
    }
}

impl ComponentTree {
    pub(crate) fn init_provide(&mut self, id: InstanceId, config: &ProvideConfig) -> Result<()> {
        let provided = compute_provided(self, id, config)?;
        let instance = self
            .instance_mut(id)
            .ok_or(ComponentError::InvalidInstance)?;
        instance.provided = Some(provided);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/inject/provide.rs"]
mod tests;
