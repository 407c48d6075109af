use std::fmt;

use crate::models::InstanceId;

pub type Result<T> = std::result::Result<T, ComponentError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    InvalidInstance,
    Provide(String),
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentError::InvalidInstance => write!(f, "invalid instance id"),
            ComponentError::Provide(msg) => write!(f, "provide failed: {}", msg),
        }
    }
}

impl std::error::Error for ComponentError {}

/// What a handler reports back to the bus. Panics are folded into
/// `Panicked` by the error boundary in `emit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    Failed(String),
    Panicked(String),
}

impl HandlerError {
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Failed(msg) => write!(f, "handler failed: {}", msg),
            HandlerError::Panicked(msg) => write!(f, "handler panicked: {}", msg),
        }
    }
}

impl std::error::Error for HandlerError {}

/// A handler failure caught during `emit`, with the context it happened in.
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    pub instance: InstanceId,
    pub event: String,
    pub info: String,
    pub error: HandlerError,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in {}: {}", self.info, self.error)
    }
}
