use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

/// Runtime switches for a component tree.
///
/// Production mode skips the development-only checks (casing tips,
/// unresolved-injection warnings, the injected-field mutation guard).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub mode: BuildMode,
    #[serde(default)]
    pub silent: bool,
}

impl RuntimeConfig {
    pub fn production() -> Self {
        Self {
            mode: BuildMode::Production,
            silent: false,
        }
    }

    pub fn is_development(&self) -> bool {
        self.mode == BuildMode::Development
    }

    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/config.rs"]
mod tests;
