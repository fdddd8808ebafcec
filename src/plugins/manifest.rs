use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::PluginError;
use super::discovery::{COMMANDS_DIR, PluginDiscovery};
use crate::common::{first_some_sync, read_frontmatter, relative_path};

/// Manifest locations, most specific first. The first file that exists and
/// parses wins.
pub const MANIFEST_PATHS: &[&str] = &[
    ".vibe-plugin/manifest.json",
    ".claude-plugin/marketplace.json",
    ".claude-plugin/plugin.json",
    "plugin.json",
    "manifest.json",
];

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_PROMPTS_DIR: &str = "prompts";

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_prompts_dir() -> String {
    DEFAULT_PROMPTS_DIR.to_string()
}

/// Author as written in a manifest: a bare string or an object with `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Plain(String),
    Structured {
        #[serde(default)]
        name: String,
    },
}

impl Author {
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(name) => name,
            Self::Structured { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCommand {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginAgent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt_file: String,
}

/// Something addressable by `(name, prompt_file)`.
pub(crate) trait PromptEntry {
    fn entry_name(&self) -> &str;
    fn prompt_file(&self) -> &str;
}

impl PromptEntry for PluginCommand {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn prompt_file(&self) -> &str {
        &self.prompt_file
    }
}

impl PromptEntry for PluginAgent {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn prompt_file(&self) -> &str {
        &self.prompt_file
    }
}

/// Keeps the first occurrence of every `(name, prompt_file)` pair and drops
/// unnamed entries.
pub(crate) fn dedup_entries<T: PromptEntry>(entries: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            !entry.entry_name().is_empty()
                && seen.insert((
                    entry.entry_name().to_string(),
                    entry.prompt_file().to_string(),
                ))
        })
        .collect()
}

/// Normalized plugin description, whichever dialect it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub commands: Vec<PluginCommand>,
    #[serde(default)]
    pub agents: Vec<PluginAgent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_server: Option<serde_json::Value>,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
}

impl PluginManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: String::new(),
            author: String::new(),
            repository: String::new(),
            commands: Vec::new(),
            agents: Vec::new(),
            mcp_server: None,
            prompts_dir: default_prompts_dir(),
        }
    }

    pub fn command(&self, name: &str) -> Option<&PluginCommand> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn agent(&self, name: &str) -> Option<&PluginAgent> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.agents.is_empty()
    }
}

// Raw on-disk dialects. Every field is optional.

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    author: Option<Author>,
    repository: Option<RawRepository>,
    #[serde(default, deserialize_with = "lenient_entries")]
    commands: Vec<RawEntry>,
    #[serde(default, deserialize_with = "lenient_entries")]
    agents: Vec<RawEntry>,
    mcp_server: Option<serde_json::Value>,
    prompts_dir: Option<String>,
    extensions: Option<Vec<RawExtension>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRepository {
    Url(String),
    Object {
        #[serde(default)]
        url: String,
    },
}

impl RawRepository {
    fn into_url(self) -> String {
        match self {
            Self::Url(url) | Self::Object { url } => url,
        }
    }
}

/// Entry lists tolerate anything: non-array values (directory references
/// and the like) read as empty, and malformed items are skipped.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<RawEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Full {
        name: Option<String>,
        description: Option<String>,
        prompt_file: Option<String>,
        prompt: Option<String>,
    },
    /// A bare path such as `"./commands/plan.md"`.
    Path(String),
}

struct EntryParts {
    name: String,
    description: String,
    prompt_file: String,
}

impl RawEntry {
    fn resolve(self, root: &Path) -> EntryParts {
        match self {
            Self::Full {
                name,
                description,
                prompt_file,
                prompt,
            } => EntryParts {
                name: name.unwrap_or_default(),
                description: description.unwrap_or_default(),
                prompt_file: prompt_file.or(prompt).unwrap_or_default(),
            },
            Self::Path(path) => {
                let file = root.join(path.trim_start_matches("./"));
                let metadata = read_frontmatter(&file);
                let stem = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                EntryParts {
                    name: metadata.get_or("name", &stem).to_string(),
                    description: metadata.get_or("description", "").to_string(),
                    prompt_file: relative_path(root, &file),
                }
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawExtension {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    developer: Option<RawDeveloper>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDeveloper {
    name: Option<String>,
}

pub struct ManifestParser;

impl ManifestParser {
    /// Manifest for the checkout at `root`, `None` when nothing is discoverable.
    pub fn parse(root: &Path) -> Option<PluginManifest> {
        first_some_sync(MANIFEST_PATHS, |relative| Self::try_load(root, relative))
            .or_else(|| PluginDiscovery::infer_manifest(root))
    }

    fn try_load(root: &Path, relative: &str) -> Option<PluginManifest> {
        let path = root.join(relative);
        if !path.is_file() {
            return None;
        }
        match Self::load_file(root, &path) {
            Ok(manifest) => {
                tracing::debug!(path = %path.display(), plugin = %manifest.name, "manifest loaded");
                Some(manifest)
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping manifest");
                None
            }
        }
    }

    pub fn load_file(root: &Path, path: &Path) -> Result<PluginManifest, PluginError> {
        let unreadable = |reason: String| PluginError::ManifestUnreadable {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        Self::from_json(root, &content).map_err(|e| unreadable(e.to_string()))
    }

    /// Converts any supported JSON dialect, merging in entries discovered
    /// under `root`.
    pub fn from_json(root: &Path, content: &str) -> Result<PluginManifest, serde_json::Error> {
        let raw: RawManifest = serde_json::from_str(content)?;
        Ok(Self::convert(root, raw))
    }

    fn convert(root: &Path, raw: RawManifest) -> PluginManifest {
        let dir_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (name, version, description, author) = match raw.extensions {
            Some(extensions) => {
                let ext = extensions.into_iter().next().unwrap_or_default();
                (
                    ext.name,
                    ext.version,
                    ext.description,
                    ext.developer.and_then(|d| d.name),
                )
            }
            None => (
                raw.name,
                raw.version,
                raw.description,
                raw.author.map(|a| a.name().to_string()),
            ),
        };

        let mut commands: Vec<PluginCommand> = raw
            .commands
            .into_iter()
            .map(|entry| {
                let parts = entry.resolve(root);
                PluginCommand {
                    name: parts.name,
                    description: parts.description,
                    prompt_file: parts.prompt_file,
                }
            })
            .collect();
        commands.extend(PluginDiscovery::discover_commands(root, COMMANDS_DIR));

        let mut agents: Vec<PluginAgent> = raw
            .agents
            .into_iter()
            .map(|entry| {
                let parts = entry.resolve(root);
                PluginAgent {
                    name: parts.name,
                    description: parts.description,
                    prompt_file: parts.prompt_file,
                }
            })
            .collect();
        agents.extend(PluginDiscovery::discover_agents(root));

        PluginManifest {
            name: name.filter(|n| !n.is_empty()).unwrap_or(dir_name),
            version: version.unwrap_or_else(default_version),
            description: description.unwrap_or_default(),
            author: author.unwrap_or_default(),
            repository: raw.repository.map(RawRepository::into_url).unwrap_or_default(),
            commands: dedup_entries(commands),
            agents: dedup_entries(agents),
            mcp_server: raw.mcp_server,
            prompts_dir: raw.prompts_dir.unwrap_or_else(default_prompts_dir),
        }
    }
}
