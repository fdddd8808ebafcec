//! Plugin resolution, checkout and registry.
//!
//! A plugin is a git repository of prompt files. Its commands and agents are
//! read from whichever manifest it ships, or inferred from its layout:
//!
//! ```text
//! ~/.vibe/
//! ├── plugins.json              registry of installed plugins and marketplaces
//! ├── commands/
//! │   └── compound_plan.md      materialized command prompts
//! └── plugins/
//!     └── compound-plugin/
//!         ├── .claude-plugin/
//!         │   └── plugin.json
//!         ├── commands/
//!         │   └── plan.md
//!         ├── prompts/
//!         └── agents/
//!             └── reviewer.md
//! ```
//!
//! Plugin commands are addressed as `plugin-name:command-name`; see
//! [`namespace`].

mod discovery;
mod error;
mod git;
mod github;
mod installed;
mod manifest;
mod marketplace;
pub mod namespace;
mod persistence;
mod resolver;
mod source;
mod store;

pub use discovery::PluginDiscovery;
pub use error::PluginError;
pub use git::{GitBackend, SystemGit};
pub use github::{GitHubClient, RepoListing, RepositoryHost};
pub use installed::InstalledPlugin;
pub use manifest::{
    Author, DEFAULT_PROMPTS_DIR, DEFAULT_VERSION, MANIFEST_PATHS, ManifestParser, PluginAgent,
    PluginCommand, PluginManifest,
};
pub use marketplace::{DESCRIPTOR_PATHS, Marketplace, MarketplacePlugin};
pub use persistence::{RegistryFile, RegistryState};
pub use resolver::{
    MANIFEST_PROBE_PATHS, ORG_PATTERNS, PLUGIN_KEYWORDS, RepositoryResolver, find_in_marketplaces,
};
pub use source::{canonical_url, is_coordinate, normalize_repo, repo_name};
pub use store::PluginStore;
