//! Core pieces shared by the event bus and the injection resolver:
//! - config: runtime mode and silence switch
//! - error: component and handler errors
//! - diagnostics: non-fatal warnings with component traces
//! - util: string helpers for diagnostics

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod util;

pub use config::{BuildMode, RuntimeConfig};
pub use diagnostics::{Diagnostic, DiagnosticReport};
pub use error::{ComponentError, HandlerError, HandlerFailure, Result};
