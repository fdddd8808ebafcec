//! The `plugins.json` registry file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::PluginError;
use super::installed::InstalledPlugin;
use super::marketplace::Marketplace;

/// In-memory registry: installed plugins by name, marketplaces by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    pub installed: BTreeMap<String, InstalledPlugin>,
    pub marketplaces: BTreeMap<String, Marketplace>,
}

#[derive(Serialize)]
struct RegistryDocumentRef<'a> {
    installed: Vec<&'a InstalledPlugin>,
    marketplaces: Vec<&'a Marketplace>,
}

#[derive(Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    installed: Vec<InstalledPlugin>,
    #[serde(default)]
    marketplaces: Vec<Marketplace>,
}

impl RegistryState {
    fn from_document(document: RegistryDocument) -> Self {
        Self {
            installed: document
                .installed
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
            marketplaces: document
                .marketplaces
                .into_iter()
                .map(|m| (m.url.clone(), m))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&RegistryDocumentRef {
            installed: self.installed.values().collect(),
            marketplaces: self.marketplaces.values().collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegistryFile {
    path: PathBuf,
}

impl RegistryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the registry. A missing file is an empty registry; an
    /// unreadable or malformed one is logged and also treated as empty.
    pub async fn load(&self) -> RegistryState {
        match self.try_load().await {
            Ok(Some(state)) => state,
            Ok(None) => RegistryState::default(),
            Err(e) => {
                tracing::warn!(error = %e, "starting with an empty plugin registry");
                RegistryState::default()
            }
        }
    }

    async fn try_load(&self) -> Result<Option<RegistryState>, PluginError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.corrupt(e)),
        };
        let document: RegistryDocument =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e))?;
        Ok(Some(RegistryState::from_document(document)))
    }

    fn corrupt(&self, reason: impl ToString) -> PluginError {
        PluginError::RegistryCorrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Rewrites the whole file through a sibling temp file and a rename.
    pub async fn save(&self, state: &RegistryState) -> Result<(), PluginError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, state.to_json()?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
