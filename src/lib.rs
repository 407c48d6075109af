//! zcomp - 组件实例运行时
//!
//! 模块结构：
//! - core: 核心框架（RuntimeConfig, 错误类型, Diagnostic）
//! - models: 组件实例树（ComponentTree, Instance）
//! - events: 实例事件总线与监听器协调（EventBus, reconcile）
//! - inject: 沿祖先链的 provide/inject 解析
//! - logging: tracing 初始化

pub mod core;
pub mod events;
pub mod inject;
pub mod logging;
pub mod models;

pub use crate::core::{
    BuildMode, ComponentError, Diagnostic, DiagnosticReport, HandlerError, HandlerFailure,
    RuntimeConfig,
};
pub use events::{Handler, ListenerBinding, ListenerMap, ListenerOps};
pub use inject::{InjectDefault, InjectOptions, InjectSpec, ProvideConfig};
pub use models::{ComponentOptions, ComponentTree, InstanceId};
