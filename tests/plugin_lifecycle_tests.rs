//! Plugin lifecycle tests: marketplace registration, source resolution
//! against a mocked GitHub, checkout through a fake git backend, registry
//! persistence and command aliasing.
//!
//! Run: cargo nextest run --test plugin_lifecycle_tests

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use vibe_plugins::{
    CommandMatch, CommandRegistry, GitBackend, GitHubClient, PluginConfig, PluginError,
    PluginStore,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Materializes a canned plugin checkout for every clone.
struct CannedGit {
    files: Vec<(&'static str, &'static str)>,
    calls: Mutex<Vec<String>>,
}

impl CannedGit {
    fn new(files: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            files,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitBackend for CannedGit {
    async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<(), PluginError> {
        self.calls.lock().unwrap().push(format!("clone {url}"));
        for (relative, content) in &self.files {
            let file = dest.join(relative);
            std::fs::create_dir_all(file.parent().unwrap())?;
            std::fs::write(file, content)?;
        }
        Ok(())
    }

    async fn pull_fast_forward(&self, dir: &Path) -> Result<(), PluginError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("pull {}", dir.file_name().unwrap().to_string_lossy()));
        Ok(())
    }
}

fn foo_plugin_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "plugin.json",
            r#"{"name": "foo", "version": "0.3.0", "author": {"name": "Org"},
                "commands": [{"name": "status", "prompt": "commands/status.md"}]}"#,
        ),
        ("commands/status.md", "Report status"),
        (
            "commands/deploy.md",
            "---\ndescription: Deploy the app\n---\nDeploy now",
        ),
        ("agents/reviewer.md", "Review code"),
        ("README.md", "Not a command"),
    ]
}

async fn open_store(home: &TempDir, server: &MockServer, git: Arc<CannedGit>) -> PluginStore {
    init_tracing();
    let config = PluginConfig::new(home.path())
        .with_api_base_url(server.uri())
        .with_raw_base_url(server.uri())
        .with_git_base_url("https://git.test")
        .with_probe_timeout(Duration::from_secs(2))
        .with_contents_timeout(Duration::from_secs(2));
    let host = Arc::new(GitHubClient::new(&config));
    PluginStore::with_backends(config, host, git).await.unwrap()
}

#[tokio::test]
async fn test_marketplace_install_and_alias() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/org/registry/main/registry.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Org Registry",
            "plugins": [{"name": "foo", "repository": "org/foo-plugin", "version": "0.3.0"}]
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let git = Arc::new(CannedGit::new(foo_plugin_files()));
    let store = open_store(&home, &server, git.clone()).await;

    let marketplace = store.add_marketplace("org/registry").await.unwrap();
    assert_eq!(marketplace.url, "https://github.com/org/registry");
    assert_eq!(marketplace.plugins.len(), 1);

    let plugin = store.install("foo", None).await.unwrap();
    assert_eq!(plugin.repository, "org/foo-plugin");
    assert_eq!(plugin.version, "0.3.0");
    assert_eq!(git.calls(), vec!["clone https://git.test/org/foo-plugin.git"]);

    let manifest = plugin.manifest.as_ref().unwrap();
    let commands: Vec<&str> = manifest.commands.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(commands, vec!["status", "deploy"]);
    assert_eq!(manifest.agents[0].name, "reviewer");
    assert_eq!(manifest.author, "Org");

    let mut registry = CommandRegistry::new(&[]);
    registry.set_plugin_commands(store.plugin_commands().await);

    assert!(matches!(registry.find("/status"), Some(CommandMatch::Builtin(_))));
    match registry.find("/foo:status") {
        Some(CommandMatch::Plugin(cmd)) => assert_eq!(cmd.plugin_name, "foo"),
        other => panic!("expected plugin command, got {other:?}"),
    }
    match registry.find("/deploy to prod") {
        Some(CommandMatch::Plugin(cmd)) => {
            assert_eq!(cmd.description, "Deploy the app");
            let prompt = std::fs::read_to_string(cmd.prompt_file.as_ref().unwrap()).unwrap();
            assert!(prompt.contains("Deploy now"));
        }
        other => panic!("expected plugin command, got {other:?}"),
    }

    assert!(home.path().join("commands/foo_status.md").is_file());
    assert!(home.path().join("commands/foo_deploy.md").is_file());
}

#[tokio::test]
async fn test_org_name_resolves_through_patterns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/acme-vibe-plugin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let git = Arc::new(CannedGit::new(foo_plugin_files()));
    let store = open_store(&home, &server, git.clone()).await;

    let plugin = store.install("acme", None).await.unwrap();
    assert_eq!(plugin.repository, "acme/acme-vibe-plugin");
    assert_eq!(git.calls(), vec!["clone https://git.test/acme/acme-vibe-plugin.git"]);
}

#[tokio::test]
async fn test_org_name_resolves_through_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "website", "full_name": "acme/website", "description": "Marketing"},
            {"name": "toolbox", "full_name": "acme/toolbox", "description": "Claude helpers"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/toolbox/contents/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let store = open_store(&home, &server, Arc::new(CannedGit::new(foo_plugin_files()))).await;

    let plugin = store.install("acme", None).await.unwrap();
    assert_eq!(plugin.repository, "acme/toolbox");
}

#[tokio::test]
async fn test_unresolvable_source_leaves_registry_untouched() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let git = Arc::new(CannedGit::new(foo_plugin_files()));
    let store = open_store(&home, &server, git.clone()).await;

    let err = store.install("ghost", None).await.unwrap_err();
    assert!(matches!(err, PluginError::SourceUnresolvable { .. }));
    assert!(git.calls().is_empty());
    assert!(!home.path().join("plugins.json").exists());
}

#[tokio::test]
async fn test_reinstall_and_disable_frees_short_alias() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let git = Arc::new(CannedGit::new(foo_plugin_files()));
    let store = open_store(&home, &server, git.clone()).await;

    store.install("org/foo-plugin", None).await.unwrap();
    store.install("https://github.com/org/foo-plugin.git", None).await.unwrap();
    assert_eq!(
        git.calls(),
        vec!["clone https://git.test/org/foo-plugin.git", "pull foo-plugin"]
    );
    assert_eq!(store.list_installed().await.len(), 1);

    let mut registry = CommandRegistry::new(&[]);
    registry.set_plugin_commands(store.plugin_commands().await);
    assert!(registry.find_plugin_command("/deploy").is_some());

    store.disable("foo").await.unwrap();
    registry.set_plugin_commands(store.plugin_commands().await);
    assert!(registry.find_plugin_command("/deploy").is_none());
    assert!(registry.find_plugin_command("/foo:deploy").is_none());
}

#[tokio::test]
async fn test_registry_file_round_trip_across_stores() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    {
        let store = open_store(&home, &server, Arc::new(CannedGit::new(foo_plugin_files()))).await;
        store.install("org/foo-plugin", None).await.unwrap();
        store.add_marketplace("org/empty").await.unwrap();
    }

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(home.path().join("plugins.json")).unwrap())
            .unwrap();
    assert_eq!(raw["installed"][0]["name"], "foo");
    assert_eq!(raw["marketplaces"][0]["url"], "https://github.com/org/empty");

    let store = open_store(&home, &server, Arc::new(CannedGit::new(Vec::new()))).await;
    let plugin = store.get_plugin("foo").await.unwrap();
    assert_eq!(plugin.repository, "org/foo-plugin");
    assert_eq!(store.list_marketplaces().await[0].name, "empty");

    let before = std::fs::read(home.path().join("plugins.json")).unwrap();
    assert!(!store.uninstall("not-installed").await.unwrap());
    assert_eq!(std::fs::read(home.path().join("plugins.json")).unwrap(), before);

    assert!(store.uninstall("foo").await.unwrap());
    assert!(!plugin.install_path.exists());
}
