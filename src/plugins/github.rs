//! GitHub REST and raw-content access used by source resolution and
//! marketplace registration.
//!
//! Every remote failure (connect error, timeout, non-success status, bad
//! JSON) is logged at debug level and reported as "not found". Callers never
//! see transport errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use super::PluginError;
use crate::config::PluginConfig;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const LISTING_QUERY: &str = "per_page=100&sort=updated";

/// One repository from an owner listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoListing {
    pub name: String,
    pub full_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read-only view of a repository host.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    async fn repo_exists(&self, repo: &str) -> bool;

    async fn path_exists(&self, repo: &str, path: &str) -> bool;

    /// Repositories of an organization, or of a user when no such org exists.
    /// Empty when neither listing is available.
    async fn list_owner_repos(&self, owner: &str) -> Vec<RepoListing>;

    /// `path` on the default branch, parsed as JSON.
    async fn fetch_raw_json(&self, repo: &str, path: &str) -> Option<Value>;
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_base_url: String,
    raw_base_url: String,
    branch: String,
    probe_timeout: Duration,
    contents_timeout: Duration,
}

impl GitHubClient {
    pub fn new(config: &PluginConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, agent);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            api_base_url: config.api_base_url.clone(),
            raw_base_url: config.raw_base_url.clone(),
            branch: config.default_branch.clone(),
            probe_timeout: config.probe_timeout,
            contents_timeout: config.contents_timeout,
        }
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, PluginError> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| PluginError::remote(url, e))?;
        if !response.status().is_success() {
            return Err(PluginError::remote(url, response.status()));
        }
        Ok(response)
    }

    async fn succeeds(&self, url: &str, timeout: Duration) -> bool {
        match self.get(url, timeout).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "probe missed");
                false
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Option<T> {
        let result = match self.get(url, self.probe_timeout).await {
            Ok(response) => response
                .json::<T>()
                .await
                .map_err(|e| PluginError::remote(url, e)),
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "remote fetch failed");
                None
            }
        }
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn repo_exists(&self, repo: &str) -> bool {
        let url = format!("{}/repos/{}", self.api_base_url, encode_path(repo));
        self.succeeds(&url, self.probe_timeout).await
    }

    async fn path_exists(&self, repo: &str, path: &str) -> bool {
        let url = format!(
            "{}/repos/{}/contents/{}",
            self.api_base_url,
            encode_path(repo),
            encode_path(path)
        );
        self.succeeds(&url, self.contents_timeout).await
    }

    async fn list_owner_repos(&self, owner: &str) -> Vec<RepoListing> {
        let owner = urlencoding::encode(owner);
        for kind in ["orgs", "users"] {
            let url = format!("{}/{kind}/{owner}/repos?{LISTING_QUERY}", self.api_base_url);
            if let Some(repos) = self.get_json::<Vec<RepoListing>>(&url).await {
                return repos;
            }
        }
        Vec::new()
    }

    async fn fetch_raw_json(&self, repo: &str, path: &str) -> Option<Value> {
        let url = format!(
            "{}/{}/{}/{}",
            self.raw_base_url,
            encode_path(repo),
            urlencoding::encode(&self.branch),
            encode_path(path)
        );
        self.get_json::<Value>(&url).await
    }
}

/// Percent-encodes each `/`-separated segment.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
