//! Engine configuration.
//!
//! Defaults can be overridden from the environment or from a TOML document:
//!
//! ```toml
//! max_call_depth = 64
//! include_stdlib = false
//! refuse_on_diagnostics = true
//! ```

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Nested user-function calls allowed before a call yields `Nothing`
    pub max_call_depth: usize,
    /// Register the standard natives and constants
    pub include_stdlib: bool,
    /// Make `Engine::interpret` refuse sources with diagnostics
    pub refuse_on_diagnostics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            include_stdlib: true,
            refuse_on_diagnostics: true,
        }
    }
}

impl EngineConfig {
    /// Defaults adjusted by `MARL_MAX_CALL_DEPTH` and `MARL_NO_STDLIB`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(depth) = max_call_depth_from_env() {
            config.max_call_depth = depth;
        }
        if no_stdlib_from_env() {
            config.include_stdlib = false;
        }
        config
    }

    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validated()
    }

    fn validated(self) -> Result<Self, EngineError> {
        if self.max_call_depth == 0 {
            return Err(EngineError::Config(
                "max_call_depth must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

fn max_call_depth_from_env() -> Option<usize> {
    let val = env::var("MARL_MAX_CALL_DEPTH").ok()?;
    val.trim().parse().ok().filter(|depth| *depth > 0)
}

fn no_stdlib_from_env() -> bool {
    env::var("MARL_NO_STDLIB")
        .map(|val| {
            let val = val.trim();
            !val.is_empty() && val != "0"
        })
        .unwrap_or(false)
}
