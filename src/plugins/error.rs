use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error(
        "Invalid plugin source '{input}': expected 'owner/repo', and no plugin repository was found in the '{org}' GitHub organization"
    )]
    SourceUnresolvable { input: String, org: String },

    #[error("git {operation} failed for {target}: {stderr}")]
    VersionControl {
        operation: &'static str,
        target: String,
        stderr: String,
    },

    #[error("Invalid plugin manifest at {path}: {reason}")]
    ManifestUnreadable { path: PathBuf, reason: String },

    #[error("Plugin registry at {path} is unreadable: {reason}")]
    RegistryCorrupt { path: PathBuf, reason: String },

    #[error("Remote request to {url} failed: {reason}")]
    RemoteUnavailable { url: String, reason: String },

    #[error("Failed to remove plugin '{name}' at {path}: {source}")]
    RemoveFailed {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PluginError {
    pub(crate) fn version_control(
        operation: &'static str,
        target: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        PluginError::VersionControl {
            operation,
            target: target.into(),
            stderr: stderr.into(),
        }
    }

    pub(crate) fn remote(url: impl Into<String>, reason: impl ToString) -> Self {
        PluginError::RemoteUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
