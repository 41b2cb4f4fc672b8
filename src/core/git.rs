//! Git metadata for environment resolution.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

/// Source-control state of the commit being deployed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitState {
    /// Current branch name (may be empty)
    pub branch: String,

    /// Release tag pointing at the current commit, if any
    pub tag: Option<String>,

    /// Abbreviated commit hash
    pub short_hash: String,
}

impl GitState {
    pub fn new(branch: impl Into<String>, tag: Option<String>, short_hash: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            tag: tag.filter(|t| !t.is_empty()),
            short_hash: short_hash.into(),
        }
    }

    /// Read git state from the repository containing `dir`.
    ///
    /// When `branch_env_var` is set and present in the environment, its value
    /// wins over git's branch. CI agents usually build a detached HEAD.
    pub async fn discover(dir: &Path, branch_env_var: Option<&str>) -> Result<Self> {
        let short_hash = git(dir, &["rev-parse", "--short", "HEAD"])
            .await?
            .context("Failed to read the current commit hash")?;

        let from_env = branch_env_var.and_then(|var| std::env::var(var).ok());
        let branch = match from_env {
            Some(branch) => {
                debug!(branch = %branch, "Using branch from CI environment");
                branch
            }
            None => git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
                .await?
                .unwrap_or_default(),
        };

        // Fails (no output) when HEAD is not exactly tagged
        let tag = git(dir, &["describe", "--tags", "--exact-match"]).await?;

        Ok(Self::new(normalize_branch(&branch), tag, short_hash))
    }
}

/// Strip the `refs/heads/` prefix some CI systems report
pub fn normalize_branch(branch: &str) -> String {
    branch
        .trim()
        .strip_prefix("refs/heads/")
        .unwrap_or(branch.trim())
        .to_string()
}

/// Run a git command; `Ok(None)` when git exits non-zero
async fn git(dir: &Path, args: &[&str]) -> Result<Option<String>> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        debug!(args = ?args, stderr = %String::from_utf8_lossy(&output.stderr).trim(), "git command failed");
        return Ok(None);
    }

    let stdout = String::from_utf8(output.stdout).context("git output is not valid UTF-8")?;
    Ok(Some(stdout.trim().to_string()))
}
