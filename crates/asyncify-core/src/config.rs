//! Generator configuration.
//!
//! Read from `[package.metadata.asyncify]` in the target crate's manifest:
//!
//! ```toml
//! [package.metadata.asyncify]
//! suffix = "_async"
//! runtime = "tokio"
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUFFIX: &str = "_async";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Appended to the original function name to form the wrapper name.
    pub suffix: String,
    /// Where wrappers schedule the original call.
    pub runtime: Runtime,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            runtime: Runtime::default(),
        }
    }
}

/// Background executor targeted by generated wrappers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runtime {
    /// `tokio::task::spawn_blocking`, returning `tokio::task::JoinHandle`.
    #[default]
    Tokio,
    /// `std::thread::spawn`, returning `std::thread::JoinHandle`.
    Thread,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Tokio => "tokio",
            Runtime::Thread => "thread",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.suffix, "_async");
        assert_eq!(config.runtime, Runtime::Tokio);
    }

    #[test]
    fn test_partial_table_uses_defaults() {
        let config: GeneratorConfig =
            serde_json::from_value(serde_json::json!({ "runtime": "thread" })).unwrap();
        assert_eq!(config.runtime, Runtime::Thread);
        assert_eq!(config.suffix, DEFAULT_SUFFIX);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<GeneratorConfig, _> =
            serde_json::from_value(serde_json::json!({ "property_name": "Run" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_runtime_names() {
        let runtime: Runtime = serde_json::from_value(serde_json::json!("thread")).unwrap();
        assert_eq!(runtime, Runtime::Thread);
        assert_eq!(runtime.to_string(), "thread");
        assert!(serde_json::from_value::<Runtime>(serde_json::json!("async-std")).is_err());
    }
}
