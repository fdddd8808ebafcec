//! Installed plugins and registered marketplaces, persisted in `plugins.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};

use super::PluginError;
use super::git::{GitBackend, SystemGit};
use super::github::{GitHubClient, RepositoryHost};
use super::installed::InstalledPlugin;
use super::manifest::{DEFAULT_VERSION, ManifestParser};
use super::marketplace::{DESCRIPTOR_PATHS, Marketplace, MarketplacePlugin};
use super::namespace::command_file_name;
use super::persistence::{RegistryFile, RegistryState};
use super::resolver::{RepositoryResolver, find_in_marketplaces};
use super::source::{canonical_url, normalize_repo, remote_points_to, repo_name};
use crate::commands::PluginCommandEntry;
use crate::common::first_some;
use crate::config::PluginConfig;

/// Owner of the plugin registry.
///
/// State is loaded once by [`PluginStore::open`]. Every mutation is applied
/// to a copy, written back in full while the write lock is held, and only
/// then made visible; a failed write leaves memory unchanged. Mutations of the
/// same install directory are serialized for the whole checkout, parse and
/// record sequence.
pub struct PluginStore {
    config: PluginConfig,
    resolver: RepositoryResolver,
    git: Arc<dyn GitBackend>,
    file: RegistryFile,
    state: RwLock<RegistryState>,
    path_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl PluginStore {
    /// Opens the store with the GitHub client and the system `git`.
    pub async fn open(config: PluginConfig) -> Result<Self, PluginError> {
        let host = Arc::new(GitHubClient::new(&config));
        Self::with_backends(config, host, Arc::new(SystemGit::new())).await
    }

    pub async fn with_backends(
        config: PluginConfig,
        host: Arc<dyn RepositoryHost>,
        git: Arc<dyn GitBackend>,
    ) -> Result<Self, PluginError> {
        tokio::fs::create_dir_all(config.plugins_dir()).await?;
        let file = RegistryFile::new(config.registry_file());
        let state = file.load().await;
        tracing::debug!(
            registry = %file.path().display(),
            installed = state.installed.len(),
            marketplaces = state.marketplaces.len(),
            "plugin registry loaded"
        );

        Ok(Self {
            config,
            resolver: RepositoryResolver::new(host),
            git,
            file,
            state: RwLock::new(state),
            path_locks: DashMap::new(),
        })
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Installs or updates the plugin `source` refers to.
    ///
    /// An existing checkout is fast-forwarded instead of cloned, after
    /// checking that its remote is `source`'s repository. The registry entry
    /// is replaced, together with any entry under another name for the same
    /// checkout, and keeps the original install time.
    pub async fn install(
        &self,
        source: &str,
        from_marketplace: Option<&str>,
    ) -> Result<InstalledPlugin, PluginError> {
        let marketplaces = self.list_marketplaces().await;
        let repo = self
            .resolver
            .resolve(source, &marketplaces, from_marketplace)
            .await?;
        let dir_name = repo_name(&repo).to_string();
        let install_path = self.config.plugins_dir().join(&dir_name);

        let lock = self.path_lock(&install_path);
        let _guard = lock.lock().await;

        self.checkout(&repo, &install_path).await?;

        let manifest = ManifestParser::parse(&install_path);
        let mut plugin = InstalledPlugin {
            name: manifest
                .as_ref()
                .map_or_else(|| dir_name.clone(), |m| m.name.clone()),
            version: manifest
                .as_ref()
                .map_or_else(|| DEFAULT_VERSION.to_string(), |m| m.version.clone()),
            description: manifest
                .as_ref()
                .map(|m| m.description.clone())
                .unwrap_or_default(),
            repository: repo.clone(),
            install_path,
            enabled: true,
            manifest,
            installed_at: Some(Utc::now()),
        };

        // Entries replaced by this install: the same name, or any other name
        // recorded for the same checkout directory.
        let replaced = {
            let mut state = self.state.write().await;
            let mut next = state.clone();
            let replaced: Vec<InstalledPlugin> = next
                .installed
                .values()
                .filter(|p| p.name == plugin.name || p.install_path == plugin.install_path)
                .cloned()
                .collect();
            if let Some(first) = replaced.iter().filter_map(|p| p.installed_at).min() {
                plugin.installed_at = Some(first);
            }
            for old in &replaced {
                next.installed.remove(&old.name);
            }
            next.installed.insert(plugin.name.clone(), plugin.clone());
            self.file.save(&next).await?;
            *state = next;
            replaced
        };

        for old in &replaced {
            if old.name != plugin.name {
                tracing::info!(
                    previous = %old.name,
                    plugin = %plugin.name,
                    "plugin renamed by update"
                );
            }
            self.remove_materialized(old).await;
        }

        let materialized = self.materialize_commands(&plugin).await;
        tracing::info!(
            plugin = %plugin.name,
            version = %plugin.version,
            repository = %repo,
            commands = materialized,
            "plugin installed"
        );
        Ok(plugin)
    }

    async fn checkout(&self, repo: &str, install_path: &Path) -> Result<(), PluginError> {
        if tokio::fs::try_exists(install_path).await? {
            if let Some(remote) = self.git.remote_url(install_path).await?
                && !remote_points_to(&remote, repo)
            {
                tracing::warn!(
                    path = %install_path.display(),
                    remote = %remote,
                    repository = %repo,
                    "install directory holds another repository"
                );
                return Err(PluginError::version_control(
                    "pull",
                    install_path.to_string_lossy(),
                    format!("checkout tracks {remote}, not {repo}"),
                ));
            }
            tracing::info!(path = %install_path.display(), "updating plugin checkout");
            return self.git.pull_fast_forward(install_path).await;
        }

        let url = format!("{}/{}.git", self.config.git_base_url, repo);
        tracing::info!(url = %url, "cloning plugin");
        if let Err(e) = self.git.clone_shallow(&url, install_path).await {
            if tokio::fs::try_exists(install_path).await.unwrap_or(false)
                && let Err(cleanup) = tokio::fs::remove_dir_all(install_path).await
            {
                tracing::warn!(
                    path = %install_path.display(),
                    error = %cleanup,
                    "failed to remove partial checkout"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    /// Copies each command prompt to `<home>/commands/<plugin>_<command>.md`.
    /// Returns how many were written; failures are logged and skipped.
    async fn materialize_commands(&self, plugin: &InstalledPlugin) -> usize {
        let Some(manifest) = &plugin.manifest else {
            return 0;
        };
        if manifest.commands.is_empty() {
            return 0;
        }

        let commands_dir = self.config.commands_dir();
        if let Err(e) = tokio::fs::create_dir_all(&commands_dir).await {
            tracing::warn!(dir = %commands_dir.display(), error = %e, "cannot create commands directory");
            return 0;
        }

        let mut written = 0;
        for command in &manifest.commands {
            let Some(prompt) = plugin.command_prompt(command) else {
                continue;
            };
            let target = commands_dir.join(command_file_name(&plugin.name, &command.name));
            match tokio::fs::write(&target, prompt).await {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!(path = %target.display(), error = %e, "failed to write command prompt")
                }
            }
        }
        written
    }

    async fn remove_materialized(&self, plugin: &InstalledPlugin) {
        let Some(manifest) = &plugin.manifest else {
            return;
        };
        let commands_dir = self.config.commands_dir();
        for command in &manifest.commands {
            let target = commands_dir.join(command_file_name(&plugin.name, &command.name));
            if let Err(e) = tokio::fs::remove_file(&target).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::debug!(path = %target.display(), error = %e, "stale command prompt left behind");
            }
        }
    }

    /// Deletes the plugin's checkout and registry entry. `Ok(false)` if no
    /// plugin of that name is installed. When the checkout cannot be deleted
    /// the entry is kept and the error returned.
    pub async fn uninstall(&self, name: &str) -> Result<bool, PluginError> {
        let Some(install_path) = self
            .state
            .read()
            .await
            .installed
            .get(name)
            .map(|p| p.install_path.clone())
        else {
            return Ok(false);
        };

        let lock = self.path_lock(&install_path);
        let _guard = lock.lock().await;

        match tokio::fs::remove_dir_all(&install_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(PluginError::RemoveFailed {
                    name: name.to_string(),
                    path: install_path,
                    source: e,
                });
            }
        }

        let removed = {
            let mut state = self.state.write().await;
            let mut next = state.clone();
            let removed = next.installed.remove(name);
            if removed.is_some() {
                self.file.save(&next).await?;
                *state = next;
            }
            removed
        };

        let Some(plugin) = removed else {
            return Ok(false);
        };
        self.remove_materialized(&plugin).await;
        tracing::info!(plugin = %name, "plugin uninstalled");
        Ok(true)
    }

    pub async fn enable(&self, name: &str) -> Result<bool, PluginError> {
        self.set_enabled(name, true).await
    }

    pub async fn disable(&self, name: &str) -> Result<bool, PluginError> {
        self.set_enabled(name, false).await
    }

    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<bool, PluginError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let Some(plugin) = next.installed.get_mut(name) else {
            return Ok(false);
        };
        plugin.enabled = enabled;
        self.file.save(&next).await?;
        *state = next;
        tracing::info!(plugin = %name, enabled, "plugin toggled");
        Ok(true)
    }

    /// Registers (or refreshes) a marketplace from its descriptor file.
    /// A repository without a readable descriptor becomes an empty marketplace.
    pub async fn add_marketplace(&self, url: &str) -> Result<Marketplace, PluginError> {
        let repo = normalize_repo(url);
        let host = self.resolver.host();
        let descriptor = first_some(DESCRIPTOR_PATHS.iter(), |path| {
            let repo = repo.as_str();
            async move { host.fetch_raw_json(repo, path).await }
        })
        .await;

        let marketplace = match descriptor {
            Some(data) => Marketplace::from_descriptor(&repo, &data),
            None => {
                tracing::warn!(repository = %repo, "no marketplace descriptor found");
                Marketplace::empty(&repo)
            }
        };

        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.marketplaces
            .insert(marketplace.url.clone(), marketplace.clone());
        self.file.save(&next).await?;
        *state = next;
        tracing::info!(
            marketplace = %marketplace.name,
            plugins = marketplace.plugins.len(),
            "marketplace added"
        );
        Ok(marketplace)
    }

    pub async fn remove_marketplace(&self, url: &str) -> Result<bool, PluginError> {
        let key = canonical_url(&normalize_repo(url));
        let mut state = self.state.write().await;
        let mut next = state.clone();
        if next.marketplaces.remove(&key).is_none() {
            return Ok(false);
        }
        self.file.save(&next).await?;
        *state = next;
        tracing::info!(marketplace = %key, "marketplace removed");
        Ok(true)
    }

    /// Installed plugins ordered by name.
    pub async fn list_installed(&self) -> Vec<InstalledPlugin> {
        self.state.read().await.installed.values().cloned().collect()
    }

    /// Marketplaces ordered by URL.
    pub async fn list_marketplaces(&self) -> Vec<Marketplace> {
        self.state.read().await.marketplaces.values().cloned().collect()
    }

    pub async fn get_plugin(&self, name: &str) -> Option<InstalledPlugin> {
        self.state.read().await.installed.get(name).cloned()
    }

    pub async fn find_in_marketplaces(
        &self,
        name: &str,
        from_marketplace: Option<&str>,
    ) -> Option<MarketplacePlugin> {
        let state = self.state.read().await;
        let marketplaces: Vec<Marketplace> = state.marketplaces.values().cloned().collect();
        find_in_marketplaces(&marketplaces, name, from_marketplace).cloned()
    }

    /// Commands of every enabled plugin with a manifest, plugins ordered by
    /// name and commands in manifest order.
    pub async fn plugin_commands(&self) -> Vec<PluginCommandEntry> {
        let state = self.state.read().await;
        state
            .installed
            .values()
            .filter(|plugin| plugin.enabled)
            .filter_map(|plugin| plugin.manifest.as_ref().map(|m| (plugin, m)))
            .flat_map(|(plugin, manifest)| {
                manifest.commands.iter().map(move |command| PluginCommandEntry {
                    name: command.name.clone(),
                    plugin_name: plugin.name.clone(),
                    description: command.description.clone(),
                    prompt_file: plugin.prompt_path(&command.prompt_file),
                })
            })
            .collect()
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.path_locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tempfile::{TempDir, tempdir};

    use crate::plugins::github::RepoListing;

    #[derive(Default)]
    struct StaticHost {
        raw: HashMap<(String, String), Value>,
    }

    #[async_trait]
    impl RepositoryHost for StaticHost {
        async fn repo_exists(&self, _repo: &str) -> bool {
            false
        }

        async fn path_exists(&self, _repo: &str, _path: &str) -> bool {
            false
        }

        async fn list_owner_repos(&self, _owner: &str) -> Vec<RepoListing> {
            Vec::new()
        }

        async fn fetch_raw_json(&self, repo: &str, path: &str) -> Option<Value> {
            self.raw.get(&(repo.to_string(), path.to_string())).cloned()
        }
    }

    fn write_files(root: &Path, files: &[(&str, &str)]) -> std::io::Result<()> {
        for (relative, content) in files {
            let path = root.join(relative);
            std::fs::create_dir_all(path.parent().unwrap())?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }

    /// Writes fixed sets of files on clone and pull, remembers each clone's
    /// remote and records every call.
    #[derive(Default)]
    struct FakeGit {
        files: Vec<(&'static str, &'static str)>,
        pull_files: Vec<(&'static str, &'static str)>,
        fail_clone: bool,
        fail_pull: bool,
        remotes: StdMutex<HashMap<PathBuf, String>>,
        calls: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl GitBackend for FakeGit {
        async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<(), PluginError> {
            self.calls.lock().unwrap().push(format!("clone {url}"));
            std::fs::create_dir_all(dest)?;
            if self.fail_clone {
                return Err(PluginError::version_control("clone", url, "fatal: not found"));
            }
            write_files(dest, &self.files)?;
            self.remotes
                .lock()
                .unwrap()
                .insert(dest.to_path_buf(), url.to_string());
            Ok(())
        }

        async fn pull_fast_forward(&self, dir: &Path) -> Result<(), PluginError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("pull {}", dir.display()));
            if self.fail_pull {
                return Err(PluginError::version_control(
                    "pull",
                    dir.to_string_lossy(),
                    "fatal: Not possible to fast-forward, aborting.",
                ));
            }
            write_files(dir, &self.pull_files)?;
            Ok(())
        }

        async fn remote_url(&self, dir: &Path) -> Result<Option<String>, PluginError> {
            Ok(self.remotes.lock().unwrap().get(dir).cloned())
        }
    }

    const MANIFEST: &str = r#"{
        "name": "compound",
        "version": "2.1.0",
        "description": "Compound engineering",
        "commands": [{"name": "plan", "prompt_file": "commands/plan.md"}]
    }"#;

    fn plugin_git() -> FakeGit {
        FakeGit {
            files: vec![
                (".claude-plugin/plugin.json", MANIFEST),
                ("commands/plan.md", "Write a plan"),
            ],
            ..Default::default()
        }
    }

    async fn store(home: &TempDir, host: StaticHost, git: Arc<FakeGit>) -> PluginStore {
        let config = PluginConfig::new(home.path()).with_git_base_url("https://git.test");
        PluginStore::with_backends(config, Arc::new(host), git)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_install_parses_and_materializes() {
        let home = tempdir().unwrap();
        let git = Arc::new(plugin_git());
        let store = store(&home, StaticHost::default(), git.clone()).await;

        let plugin = store.install("EveryInc/compound-plugin", None).await.unwrap();
        assert_eq!(plugin.name, "compound");
        assert_eq!(plugin.version, "2.1.0");
        assert_eq!(plugin.repository, "EveryInc/compound-plugin");
        assert_eq!(plugin.install_path, home.path().join("plugins/compound-plugin"));
        assert!(plugin.installed_at.is_some());
        assert_eq!(
            *git.calls.lock().unwrap(),
            vec!["clone https://git.test/EveryInc/compound-plugin.git".to_string()]
        );

        let materialized = home.path().join("commands/compound_plan.md");
        assert_eq!(std::fs::read_to_string(materialized).unwrap(), "Write a plan");

        let entries = store.plugin_commands().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].plugin_name, "compound");
        assert_eq!(
            entries[0].prompt_file.as_deref(),
            Some(plugin.install_path.join("commands/plan.md").as_path())
        );
    }

    #[tokio::test]
    async fn test_reinstall_pulls_and_keeps_single_entry() {
        let home = tempdir().unwrap();
        let git = Arc::new(plugin_git());
        let store = store(&home, StaticHost::default(), git.clone()).await;

        let first = store.install("org/compound-plugin", None).await.unwrap();
        store.disable("compound").await.unwrap();
        let second = store.install("https://github.com/org/compound-plugin.git", None).await.unwrap();

        let calls = git.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].starts_with("pull "));
        assert_eq!(store.list_installed().await.len(), 1);
        assert_eq!(second.installed_at, first.installed_at);
        assert!(second.enabled);
    }

    #[tokio::test]
    async fn test_failed_clone_leaves_no_trace() {
        let home = tempdir().unwrap();
        let git = Arc::new(FakeGit {
            fail_clone: true,
            ..Default::default()
        });
        let store = store(&home, StaticHost::default(), git).await;

        let err = store.install("org/broken", None).await.unwrap_err();
        assert!(matches!(err, PluginError::VersionControl { .. }));
        assert!(!home.path().join("plugins/broken").exists());
        assert!(store.list_installed().await.is_empty());
        assert!(!home.path().join("plugins.json").exists());
    }

    #[tokio::test]
    async fn test_install_without_manifest_uses_repo_name() {
        let home = tempdir().unwrap();
        let git = Arc::new(FakeGit {
            files: vec![("src/main.rs", "fn main() {}")],
            ..Default::default()
        });
        let store = store(&home, StaticHost::default(), git).await;

        let plugin = store.install("org/plain-repo", None).await.unwrap();
        assert_eq!(plugin.name, "plain-repo");
        assert_eq!(plugin.version, "1.0.0");
        assert!(plugin.manifest.is_none());
        assert!(store.plugin_commands().await.is_empty());
    }

    #[tokio::test]
    async fn test_uninstall() {
        let home = tempdir().unwrap();
        let store = store(&home, StaticHost::default(), Arc::new(plugin_git())).await;
        let plugin = store.install("org/compound-plugin", None).await.unwrap();

        assert!(store.uninstall("compound").await.unwrap());
        assert!(!plugin.install_path.exists());
        assert!(!home.path().join("commands/compound_plan.md").exists());
        assert!(store.get_plugin("compound").await.is_none());
        assert!(!store.uninstall("compound").await.unwrap());
    }

    #[tokio::test]
    async fn test_uninstall_unknown_does_not_write() {
        let home = tempdir().unwrap();
        let store = store(&home, StaticHost::default(), Arc::new(plugin_git())).await;
        store.install("org/compound-plugin", None).await.unwrap();
        let before = std::fs::read(home.path().join("plugins.json")).unwrap();

        assert!(!store.uninstall("nope").await.unwrap());
        assert_eq!(std::fs::read(home.path().join("plugins.json")).unwrap(), before);
    }

    #[tokio::test]
    async fn test_enable_disable() {
        let home = tempdir().unwrap();
        let store = store(&home, StaticHost::default(), Arc::new(plugin_git())).await;
        store.install("org/compound-plugin", None).await.unwrap();

        assert!(store.disable("compound").await.unwrap());
        assert!(store.plugin_commands().await.is_empty());
        assert!(store.enable("compound").await.unwrap());
        assert_eq!(store.plugin_commands().await.len(), 1);
        assert!(!store.enable("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let home = tempdir().unwrap();
        {
            let store = store(&home, StaticHost::default(), Arc::new(plugin_git())).await;
            store.install("org/compound-plugin", None).await.unwrap();
            store.disable("compound").await.unwrap();
        }
        let store = store(&home, StaticHost::default(), Arc::new(plugin_git())).await;
        let plugin = store.get_plugin("compound").await.unwrap();
        assert!(!plugin.enabled);
        assert_eq!(plugin.manifest.unwrap().commands.len(), 1);
    }

    #[tokio::test]
    async fn test_marketplace_crud() {
        let home = tempdir().unwrap();
        let mut host = StaticHost::default();
        host.raw.insert(
            ("org/registry".into(), ".claude-plugin/marketplace.json".into()),
            json!({"name": "Org Registry", "plugins": [{"name": "foo", "repository": "org/foo-plugin"}]}),
        );
        let store = store(&home, host, Arc::new(FakeGit::default())).await;

        let mp = store.add_marketplace("github.com/org/registry/").await.unwrap();
        assert_eq!(mp.name, "Org Registry");
        assert_eq!(mp.url, "https://github.com/org/registry");

        let empty = store.add_marketplace("org/nothing").await.unwrap();
        assert_eq!(empty.name, "nothing");
        assert!(empty.plugins.is_empty());

        let urls: Vec<String> = store.list_marketplaces().await.into_iter().map(|m| m.url).collect();
        assert_eq!(urls, vec!["https://github.com/org/nothing", "https://github.com/org/registry"]);

        assert_eq!(
            store.find_in_marketplaces("foo", None).await.unwrap().repository,
            "org/foo-plugin"
        );
        assert!(store.remove_marketplace("https://github.com/org/registry").await.unwrap());
        assert!(!store.remove_marketplace("org/registry").await.unwrap());
        assert!(store.find_in_marketplaces("foo", None).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_installs_of_same_plugin() {
        let home = tempdir().unwrap();
        let git = Arc::new(plugin_git());
        let store = Arc::new(store(&home, StaticHost::default(), git.clone()).await);

        let a = tokio::spawn({
            let store = store.clone();
            async move { store.install("org/compound-plugin", None).await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.install("org/compound-plugin", None).await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let calls = git.calls.lock().unwrap().clone();
        assert_eq!(calls.iter().filter(|c| c.starts_with("clone")).count(), 1);
        assert_eq!(store.list_installed().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_that_renames_plugin_replaces_entry() {
        let home = tempdir().unwrap();
        let git = Arc::new(FakeGit {
            files: vec![("commands/status.md", "Report status")],
            pull_files: vec![("plugin.json", r#"{"name": "foo"}"#)],
            ..Default::default()
        });
        let store = store(&home, StaticHost::default(), git).await;

        let first = store.install("org/foo-plugin", None).await.unwrap();
        assert_eq!(first.name, "foo-plugin");
        assert!(home.path().join("commands/foo-plugin_status.md").exists());

        let second = store.install("org/foo-plugin", None).await.unwrap();
        assert_eq!(second.name, "foo");
        assert_eq!(second.installed_at, first.installed_at);
        let names: Vec<String> = store.list_installed().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["foo"]);
        assert!(!home.path().join("commands/foo-plugin_status.md").exists());

        assert!(store.uninstall("foo").await.unwrap());
        assert!(store.list_installed().await.is_empty());
        assert!(!second.install_path.exists());
    }

    #[tokio::test]
    async fn test_failed_pull_leaves_registry_untouched() {
        let home = tempdir().unwrap();
        {
            let store = store(&home, StaticHost::default(), Arc::new(plugin_git())).await;
            store.install("org/compound-plugin", None).await.unwrap();
        }
        let registry = home.path().join("plugins.json");
        let before = std::fs::read(&registry).unwrap();

        let git = Arc::new(FakeGit {
            fail_pull: true,
            ..Default::default()
        });
        let store = store(&home, StaticHost::default(), git.clone()).await;
        let err = store.install("org/compound-plugin", None).await.unwrap_err();

        assert!(matches!(err, PluginError::VersionControl { operation: "pull", .. }));
        assert_eq!(git.calls.lock().unwrap().len(), 1);
        assert_eq!(std::fs::read(&registry).unwrap(), before);
        assert!(home.path().join("plugins/compound-plugin").exists());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_memory_unchanged() {
        let home = tempdir().unwrap();
        let store = store(&home, StaticHost::default(), Arc::new(plugin_git())).await;
        store.install("org/compound-plugin", None).await.unwrap();
        let before = std::fs::read(home.path().join("plugins.json")).unwrap();

        // The temp file path is taken by a directory, so every save fails.
        std::fs::create_dir(home.path().join("plugins.json.tmp")).unwrap();

        assert!(store.disable("compound").await.is_err());
        assert!(store.get_plugin("compound").await.unwrap().enabled);
        assert!(store.add_marketplace("org/registry").await.is_err());
        assert!(store.list_marketplaces().await.is_empty());
        assert_eq!(std::fs::read(home.path().join("plugins.json")).unwrap(), before);

        std::fs::remove_dir(home.path().join("plugins.json.tmp")).unwrap();
        assert!(store.disable("compound").await.unwrap());
        let raw = std::fs::read_to_string(home.path().join("plugins.json")).unwrap();
        assert!(!raw.contains("github.com/org/registry"));
    }

    #[tokio::test]
    async fn test_install_refuses_checkout_of_other_repository() {
        let home = tempdir().unwrap();
        let git = Arc::new(plugin_git());
        let store = store(&home, StaticHost::default(), git.clone()).await;
        store.install("a/tools", None).await.unwrap();

        let err = store.install("b/tools", None).await.unwrap_err();
        match err {
            PluginError::VersionControl { operation, stderr, .. } => {
                assert_eq!(operation, "pull");
                assert!(stderr.contains("https://git.test/a/tools.git"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(git.calls.lock().unwrap().len(), 1);
        assert_eq!(store.get_plugin("compound").await.unwrap().repository, "a/tools");

        store.install("https://github.com/a/tools", None).await.unwrap();
        assert_eq!(git.calls.lock().unwrap().len(), 2);
    }
}
