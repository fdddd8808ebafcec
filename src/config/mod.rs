//! Configuration for the plugin subsystem.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vibe_plugins::config::PluginConfig;
//!
//! # fn example() -> Result<(), vibe_plugins::config::ConfigError> {
//! let config = PluginConfig::from_env()?.with_probe_timeout(Duration::from_secs(3));
//! println!("registry at {}", config.registry_file().display());
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod settings;

pub use env::EnvConfigSource;
pub use settings::PluginConfig;

use thiserror::Error;

/// Errors that can occur while assembling configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The key with invalid value
        key: String,
        /// Error message
        message: String,
    },

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),

    /// No home directory could be determined
    #[error("Home directory not found; set {var} explicitly")]
    HomeNotFound {
        /// The variable that overrides the home directory
        var: &'static str,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
