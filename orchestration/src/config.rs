//! Host configuration: compile defaults and orchestrator tuning.
//!
//! Loaded from a TOML file, environment variables, or both. Every field
//! has a working default, so a bare `HostConfig::default()` is a valid
//! configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::options::{CompileOptionsOverrides, DEFAULT_MODULE, DEFAULT_TARGET};

/// Default per-request deadline in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Configuration for the compiler host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Run the compiler behind the isolated endpoint rather than inline.
    pub use_isolated_compiler: bool,
    /// ECMAScript target for emitted code.
    pub target: String,
    /// Module system for emitted code.
    pub module: String,
    /// Enable strict type checking.
    pub strict: bool,
    /// Emit source maps alongside compiled output.
    pub source_map: bool,
    /// Per-request deadline in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            use_isolated_compiler: true,
            target: DEFAULT_TARGET.to_string(),
            module: DEFAULT_MODULE.to_string(),
            strict: true,
            source_map: false,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl HostConfig {
    /// Read from `TSHOST_*` environment variables, falling back to the
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            use_isolated_compiler: env_bool("TSHOST_USE_WORKER", defaults.use_isolated_compiler),
            target: std::env::var("TSHOST_TARGET").unwrap_or(defaults.target),
            module: std::env::var("TSHOST_MODULE").unwrap_or(defaults.module),
            strict: env_bool("TSHOST_STRICT", defaults.strict),
            source_map: env_bool("TSHOST_SOURCE_MAP", defaults.source_map),
            request_timeout_ms: std::env::var("TSHOST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_ms),
        }
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-file option overrides derived from this configuration.
    pub fn compile_overrides(&self, file_name: impl Into<String>) -> CompileOptionsOverrides {
        CompileOptionsOverrides {
            target: Some(self.target.clone()),
            module: Some(self.module.clone()),
            strict: Some(self.strict),
            source_map: Some(self.source_map),
            file_name: Some(file_name.into()),
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
        Ok(v) if v == "0" || v.eq_ignore_ascii_case("false") => false,
        // Unset or unrecognized values keep the default.
        _ => default,
    }
}
