use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::manifest::{PluginAgent, PluginCommand, PluginManifest};

/// A plugin checked out under the plugins directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// `owner/repo` the checkout was cloned from.
    pub repository: String,
    pub install_path: PathBuf,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PluginManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

fn enabled_by_default() -> bool {
    true
}

impl InstalledPlugin {
    pub fn command(&self, name: &str) -> Option<&PluginCommand> {
        self.manifest.as_ref()?.command(name)
    }

    pub fn agent(&self, name: &str) -> Option<&PluginAgent> {
        self.manifest.as_ref()?.agent(name)
    }

    /// Prompt text of `command`, or `None` if it has no readable prompt file.
    pub fn command_prompt(&self, command: &PluginCommand) -> Option<String> {
        self.read_prompt(&command.prompt_file)
    }

    pub fn agent_prompt(&self, agent: &PluginAgent) -> Option<String> {
        self.read_prompt(&agent.prompt_file)
    }

    /// Where `prompt_file` lives: relative to the checkout, else below the
    /// manifest's prompts directory.
    pub fn prompt_path(&self, prompt_file: &str) -> Option<PathBuf> {
        if prompt_file.is_empty() {
            return None;
        }
        let direct = self.install_path.join(prompt_file);
        if direct.is_file() {
            return Some(direct);
        }
        let manifest = self.manifest.as_ref()?;
        let nested = self
            .install_path
            .join(&manifest.prompts_dir)
            .join(prompt_file);
        nested.is_file().then_some(nested)
    }

    fn read_prompt(&self, prompt_file: &str) -> Option<String> {
        let path = self.prompt_path(prompt_file)?;
        read_text(&path)
    }
}

fn read_text(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "prompt file unreadable");
            None
        }
    }
}
