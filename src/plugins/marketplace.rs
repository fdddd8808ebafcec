use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::manifest::DEFAULT_VERSION;
use super::source::{canonical_url, repo_name};

/// Descriptor locations inside a marketplace repository, tried in order.
pub const DESCRIPTOR_PATHS: &[&str] = &[
    "registry.json",
    "marketplace.json",
    ".claude-plugin/marketplace.json",
    ".vibe-plugin/marketplace.json",
];

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplacePlugin {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marketplace {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Canonical `https://github.com/{owner}/{repo}`; the registry key.
    pub url: String,
    #[serde(default)]
    pub plugins: Vec<MarketplacePlugin>,
}

impl Marketplace {
    /// Placeholder for a marketplace repository without a readable descriptor.
    pub fn empty(repo: &str) -> Self {
        Self {
            name: repo_name(repo).to_string(),
            version: default_version(),
            url: canonical_url(repo),
            plugins: Vec::new(),
        }
    }

    /// Builds a marketplace from a descriptor in either the native
    /// (`plugins`) or the compatibility (`extensions`) schema.
    pub fn from_descriptor(repo: &str, data: &Value) -> Self {
        let plugins = if let Some(entries) = data.get("plugins").and_then(Value::as_array) {
            entries
                .iter()
                .map(|entry| Self::entry(entry, text(entry, "author")))
                .collect()
        } else if let Some(entries) = data.get("extensions").and_then(Value::as_array) {
            entries
                .iter()
                .map(|entry| {
                    let author = entry
                        .get("developer")
                        .map(|d| text(d, "name"))
                        .unwrap_or_default();
                    Self::entry(entry, author)
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            name: non_empty(text(data, "name")).unwrap_or_else(|| repo_name(repo).to_string()),
            version: non_empty(text(data, "version")).unwrap_or_else(default_version),
            url: canonical_url(repo),
            plugins,
        }
    }

    fn entry(entry: &Value, author: String) -> MarketplacePlugin {
        MarketplacePlugin {
            name: text(entry, "name"),
            version: non_empty(text(entry, "version")).unwrap_or_else(default_version),
            description: text(entry, "description"),
            author,
            repository: text(entry, "repository"),
        }
    }

    pub fn find(&self, name: &str) -> Option<&MarketplacePlugin> {
        self.plugins.iter().find(|p| p.name == name)
    }
}

/// String at `key`; an object value contributes its `name` (native author objects).
fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
