//! 组件实例树

pub mod instance_tree;

pub use instance_tree::{
    ComponentOptions, ComponentTree, ErrorHandler, Instance, InstanceId, WarnHandler,
};
