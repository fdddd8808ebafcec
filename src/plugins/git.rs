//! Version-control operations on plugin checkouts.

use std::path::Path;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use super::PluginError;

#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Depth-1 clone of `url` into `dest`, which must not exist yet.
    async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<(), PluginError>;

    /// Fast-forward-only pull inside an existing checkout.
    async fn pull_fast_forward(&self, dir: &Path) -> Result<(), PluginError>;

    /// URL of the checkout's `origin` remote. `None` when the backend cannot
    /// tell or the checkout has no such remote.
    async fn remote_url(&self, _dir: &Path) -> Result<Option<String>, PluginError> {
        Ok(None)
    }
}

/// Runs the `git` executable found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: String,
}

impl SystemGit {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn output(
        &self,
        operation: &'static str,
        target: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<Output, PluginError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        command
            .output()
            .await
            .map_err(|e| PluginError::version_control(operation, target, e.to_string()))
    }

    async fn run(
        &self,
        operation: &'static str,
        target: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<(), PluginError> {
        let output = self.output(operation, target, args, cwd).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PluginError::version_control(operation, target, stderr));
        }
        Ok(())
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitBackend for SystemGit {
    async fn clone_shallow(&self, url: &str, dest: &Path) -> Result<(), PluginError> {
        let dest_str = dest.to_string_lossy();
        tracing::debug!(url = %url, dest = %dest_str, "git clone");
        self.run("clone", url, &["clone", "--depth", "1", url, &*dest_str], None)
            .await
    }

    async fn pull_fast_forward(&self, dir: &Path) -> Result<(), PluginError> {
        let target = dir.to_string_lossy();
        tracing::debug!(dir = %target, "git pull");
        self.run("pull", &target, &["pull", "--ff-only"], Some(dir))
            .await
    }

    async fn remote_url(&self, dir: &Path) -> Result<Option<String>, PluginError> {
        let target = dir.to_string_lossy();
        let output = self
            .output("config", &target, &["config", "--get", "remote.origin.url"], Some(dir))
            .await?;
        // Exit status 1 means the key is unset.
        if !output.status.success() {
            return Ok(None);
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!url.is_empty()).then_some(url))
    }
}
