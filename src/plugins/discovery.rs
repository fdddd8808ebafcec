use std::path::Path;

use super::manifest::{PluginAgent, PluginCommand, PluginManifest, dedup_entries};
use crate::common::{markdown_files, read_frontmatter, relative_path};

pub(super) const COMMANDS_DIR: &str = "commands";
pub(super) const PROMPTS_DIR: &str = "prompts";
pub(super) const AGENTS_DIR: &str = "agents";

/// Directory-structure discovery of prompt files inside a plugin checkout.
pub struct PluginDiscovery;

impl PluginDiscovery {
    /// Commands from markdown files under `root/<dir_name>`, recursively.
    pub fn discover_commands(root: &Path, dir_name: &str) -> Vec<PluginCommand> {
        markdown_files(&root.join(dir_name))
            .into_iter()
            .map(|file| {
                let metadata = read_frontmatter(&file);
                let stem = file_stem(&file);
                PluginCommand {
                    name: metadata.get_or("name", &stem).to_string(),
                    description: metadata.get_or("description", "").to_string(),
                    prompt_file: relative_path(root, &file),
                }
            })
            .collect()
    }

    /// Agents from `root/agents/`. Nested files default to their path below
    /// `agents/` without the extension (`review/security`).
    pub fn discover_agents(root: &Path) -> Vec<PluginAgent> {
        let agents_dir = root.join(AGENTS_DIR);
        markdown_files(&agents_dir)
            .into_iter()
            .map(|file| {
                let metadata = read_frontmatter(&file);
                let default_name = relative_path(&agents_dir, &file.with_extension(""));
                PluginAgent {
                    name: metadata.get_or("name", &default_name).to_string(),
                    description: metadata.get_or("description", "").to_string(),
                    prompt_file: relative_path(root, &file),
                }
            })
            .collect()
    }

    /// Manifest inferred from `commands/`, `prompts/` and `agents/` when the
    /// checkout has no parseable manifest file. `None` if nothing was found.
    pub fn infer_manifest(root: &Path) -> Option<PluginManifest> {
        let commands: Vec<PluginCommand> = [COMMANDS_DIR, PROMPTS_DIR]
            .into_iter()
            .flat_map(|dir| Self::discover_commands(root, dir))
            .collect();
        let agents = Self::discover_agents(root);

        let mut manifest = PluginManifest::new(dir_name(root));
        manifest.commands = dedup_entries(commands);
        manifest.agents = dedup_entries(agents);

        if manifest.is_empty() {
            tracing::debug!(root = %root.display(), "no manifest and no prompt files");
            return None;
        }
        tracing::debug!(
            root = %root.display(),
            commands = manifest.commands.len(),
            agents = manifest.agents.len(),
            "manifest inferred from directory layout"
        );
        Some(manifest)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn dir_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
