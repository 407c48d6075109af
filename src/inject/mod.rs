//! Provide/inject: ancestors publish named values, descendants look them up
//! by walking towards the root.

pub mod provide;
pub mod resolve;

pub use provide::{compute_provided, ProvideConfig, ProvideFn};
pub use resolve::{
    resolve_inject, DefaultFn, InjectDefault, InjectOptions, InjectSpec, InjectedField,
};
