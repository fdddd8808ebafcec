//! Turns a user supplied plugin reference into an `owner/repo` coordinate.

use std::sync::Arc;

use super::PluginError;
use super::github::{RepoListing, RepositoryHost};
use super::marketplace::{Marketplace, MarketplacePlugin};
use super::source::{canonical_url, is_coordinate, normalize_repo};
use crate::common::{first_some, first_some_concurrent, first_some_sync};

/// Repository names probed under an organization, most likely first.
/// `{org}` is replaced by the organization name.
pub const ORG_PATTERNS: &[&str] = &[
    "{org}-plugin",
    "{org}-vibe-plugin",
    "{org}-claude-plugin",
    "plugin",
    "vibe-plugin",
    "claude-plugin",
];

/// Lowercased substrings that make a listed repository a plugin candidate.
pub const PLUGIN_KEYWORDS: &[&str] = &["plugin", "vibe", "claude", "extension", "addon"];

/// Paths whose presence marks a candidate repository as a plugin.
pub const MANIFEST_PROBE_PATHS: &[&str] = &[
    ".vibe-plugin/manifest.json",
    ".claude-plugin/marketplace.json",
    "plugin.json",
    "manifest.json",
    "commands",
    "prompts",
];

/// First plugin named `name` across `marketplaces`, or only within the one
/// whose URL matches `from_marketplace`.
pub fn find_in_marketplaces<'a>(
    marketplaces: &'a [Marketplace],
    name: &str,
    from_marketplace: Option<&str>,
) -> Option<&'a MarketplacePlugin> {
    let scope = from_marketplace.map(|url| canonical_url(&normalize_repo(url)));
    first_some_sync(
        marketplaces
            .iter()
            .filter(|mp| scope.as_deref().is_none_or(|url| mp.url == url)),
        |mp| mp.find(name),
    )
}

#[derive(Clone)]
pub struct RepositoryResolver {
    host: Arc<dyn RepositoryHost>,
}

impl RepositoryResolver {
    pub fn new(host: Arc<dyn RepositoryHost>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<dyn RepositoryHost> {
        &self.host
    }

    /// Resolves `source` to `owner/repo`.
    ///
    /// Marketplace entries are consulted for bare names, or for any source
    /// when `from_marketplace` is given. A bare name left after that is
    /// searched for inside the GitHub organization of the same name.
    pub async fn resolve(
        &self,
        source: &str,
        marketplaces: &[Marketplace],
        from_marketplace: Option<&str>,
    ) -> Result<String, PluginError> {
        let mut candidate = source.trim().to_string();

        if (from_marketplace.is_some() || !candidate.contains('/'))
            && let Some(entry) = find_in_marketplaces(marketplaces, &candidate, from_marketplace)
            && !entry.repository.is_empty()
        {
            tracing::debug!(
                plugin = %candidate,
                repository = %entry.repository,
                "resolved through marketplace"
            );
            candidate = entry.repository.clone();
        }

        let repo = normalize_repo(&candidate);
        if is_coordinate(&repo) {
            return Ok(repo);
        }

        if let Some(found) = self.resolve_org(&repo).await {
            tracing::info!(org = %repo, repository = %found, "resolved plugin from organization");
            return Ok(found);
        }

        Err(PluginError::SourceUnresolvable {
            input: source.to_string(),
            org: repo,
        })
    }

    async fn resolve_org(&self, org: &str) -> Option<String> {
        if org.is_empty() {
            return None;
        }
        if let Some(found) = self.probe_patterns(org).await {
            return Some(found);
        }
        self.search_listing(org).await
    }

    async fn probe_patterns(&self, org: &str) -> Option<String> {
        let candidates = ORG_PATTERNS
            .iter()
            .map(|pattern| format!("{org}/{}", pattern.replace("{org}", org)));

        first_some_concurrent(candidates, |repo| async move {
            self.host.repo_exists(&repo).await.then_some(repo)
        })
        .await
    }

    async fn search_listing(&self, org: &str) -> Option<String> {
        let listing = self.host.list_owner_repos(org).await;
        let candidates: Vec<RepoListing> = listing.into_iter().filter(looks_like_plugin).collect();
        tracing::debug!(org = %org, candidates = candidates.len(), "searching organization listing");

        // Sequential: stop issuing contents requests at the first plugin.
        first_some(candidates, |repo| async move {
            self.has_manifest(&repo.full_name)
                .await
                .then_some(repo.full_name)
        })
        .await
    }

    async fn has_manifest(&self, repo: &str) -> bool {
        first_some_concurrent(MANIFEST_PROBE_PATHS.iter(), |path| async move {
            self.host.path_exists(repo, path).await.then_some(())
        })
        .await
        .is_some()
    }
}

fn looks_like_plugin(repo: &RepoListing) -> bool {
    let name = repo.name.to_lowercase();
    let description = repo.description.to_lowercase();
    PLUGIN_KEYWORDS
        .iter()
        .any(|kw| name.contains(kw) || description.contains(kw))
}
