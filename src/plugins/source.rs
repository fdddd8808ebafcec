//! Repository coordinates (`owner/repo`) and their normalization.

const HTTPS_PREFIX: &str = "https://github.com/";
const BARE_PREFIX: &str = "github.com/";
const GIT_SUFFIX: &str = ".git";

/// Normalizes a user supplied source toward `owner/repo`.
///
/// Strips a `https://github.com/` or `github.com/` prefix, a trailing `.git`
/// and trailing slashes. Bare names pass through unchanged.
pub fn normalize_repo(source: &str) -> String {
    let mut repo = source.trim();
    if let Some(rest) = repo.strip_prefix(HTTPS_PREFIX) {
        repo = rest;
    } else if let Some(rest) = repo.strip_prefix(BARE_PREFIX) {
        repo = rest;
    }
    repo = repo.trim_end_matches('/');
    if let Some(rest) = repo.strip_suffix(GIT_SUFFIX) {
        repo = rest;
    }
    repo.trim_end_matches('/').to_string()
}

/// A normalized source that names an owner and a repository.
pub fn is_coordinate(repo: &str) -> bool {
    repo.contains('/')
}

/// Final path segment, used as the install directory and fallback plugin name.
pub fn repo_name(repo: &str) -> &str {
    repo.rsplit('/').next().unwrap_or(repo)
}

/// Marketplace key: `https://github.com/{owner}/{repo}`.
pub fn canonical_url(repo: &str) -> String {
    format!("{HTTPS_PREFIX}{repo}")
}

/// Whether a git remote URL (https, ssh or scp-like) names `repo`.
/// GitHub coordinates are compared case-insensitively.
pub fn remote_points_to(remote: &str, repo: &str) -> bool {
    let remote = remote.trim().trim_end_matches('/');
    let remote = remote.strip_suffix(GIT_SUFFIX).unwrap_or(remote).to_lowercase();
    let repo = repo.to_lowercase();
    remote == repo || remote.ends_with(&format!("/{repo}")) || remote.ends_with(&format!(":{repo}"))
}
