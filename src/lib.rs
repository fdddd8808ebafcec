//! # vibe-plugins
//!
//! Plugin resolution, installation and command aliasing for the vibe agent.
//!
//! A plugin is a git repository holding prompt files. This crate turns a user
//! supplied reference (`owner/repo`, a GitHub URL, a marketplace entry name or
//! a bare organization name) into a local checkout, reads whichever manifest
//! dialect the repository uses, and exposes the plugin's commands through a
//! single alias namespace shared with the built-in commands.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vibe_plugins::{CommandRegistry, CommandMatch, PluginConfig, PluginStore};
//!
//! #[tokio::main]
//! async fn main() -> vibe_plugins::Result<()> {
//!     let store = PluginStore::open(PluginConfig::from_env()?).await?;
//!     store.add_marketplace("EveryInc/every-marketplace").await?;
//!     let plugin = store.install("compound-engineering", None).await?;
//!     println!("installed {} {}", plugin.name, plugin.version);
//!
//!     let mut registry = CommandRegistry::new(&[]);
//!     registry.set_plugin_commands(store.plugin_commands().await);
//!     if let Some(CommandMatch::Plugin(cmd)) = registry.find("/compound-engineering:plan now") {
//!         println!("{} -> {:?}", cmd.name, cmd.prompt_file);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod commands;
pub mod common;
pub mod config;
pub mod plugins;

pub use commands::{
    BuiltinHandler, Command, CommandMatch, CommandRegistry, PluginCommandEntry, builtin_commands,
};
pub use config::{ConfigError, PluginConfig};
pub use plugins::{
    Author, GitBackend, GitHubClient, InstalledPlugin, Marketplace, MarketplacePlugin,
    ManifestParser, PluginAgent, PluginCommand, PluginError, PluginManifest, PluginStore,
    RepositoryHost, RepositoryResolver, SystemGit, normalize_repo,
};

/// Error type for vibe-plugins operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Plugin resolution, checkout or registry operation failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the failure came from the install pipeline itself
    /// (unresolvable source or a failed clone/pull) rather than local state.
    pub fn is_install_failure(&self) -> bool {
        matches!(
            self,
            Error::Plugin(PluginError::SourceUnresolvable { .. } | PluginError::VersionControl { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
