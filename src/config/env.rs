//! Environment variable configuration source
//!
//! Read-only access to `VIBE_*` overrides. Variables are looked up through a
//! closure so tests can supply a fixed map instead of mutating the process
//! environment.

use std::collections::HashMap;

use super::{ConfigError, ConfigResult};

pub const ENV_PREFIX: &str = "VIBE_";

type Lookup = Box<dyn Fn(&str) -> Result<String, std::env::VarError> + Send + Sync>;

/// Read-only environment variable source with a key prefix.
pub struct EnvConfigSource {
    prefix: String,
    lookup: Lookup,
}

impl EnvConfigSource {
    /// Source backed by the process environment with the `VIBE_` prefix
    pub fn new() -> Self {
        Self::prefixed(ENV_PREFIX)
    }

    /// Source backed by the process environment with a custom prefix
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            lookup: Box::new(|key| std::env::var(key)),
        }
    }

    /// Source backed by a fixed map; keys are full variable names
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self {
            prefix: ENV_PREFIX.to_string(),
            lookup: Box::new(move |key| {
                vars.get(key)
                    .cloned()
                    .ok_or(std::env::VarError::NotPresent)
            }),
        }
    }

    /// Full environment variable name for a dotted key (`github.api_url` -> `VIBE_GITHUB_API_URL`)
    pub fn env_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase().replace('.', "_"))
    }

    /// Value of `key`, `None` when unset or empty
    pub fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        match (self.lookup)(&self.env_key(key)) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }
}

impl Default for EnvConfigSource {
    fn default() -> Self {
        Self::new()
    }
}
