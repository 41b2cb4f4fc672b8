//! Environment resolution: git state -> ApplicationVersion.
//!
//! Built-in policy, evaluated in order:
//! 1. Tagged commit -> PRD, version = tag
//! 2. Branch `master` -> ACP, version = SNAPSHOT
//! 3. Anything else -> DEV, version = short hash
//!
//! A plugin defining `deploy_env_logic` replaces the policy completely.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::git::GitState;
use crate::domain::{ApplicationVersion, Environment, SNAPSHOT};
use crate::plugins::{PluginFunction, PluginRegistry};

/// Plugin symbol replacing the built-in policy
pub const DEPLOY_ENV_LOGIC: &str = "deploy_env_logic";

/// Trunk branch deployed to acceptance
pub const TRUNK_BRANCH: &str = "master";

/// Apply the built-in policy
pub fn resolve(git: &GitState) -> ApplicationVersion {
    match &git.tag {
        Some(tag) => ApplicationVersion::new(Environment::Production, tag.clone(), git.branch.clone()),
        None if git.branch == TRUNK_BRANCH => {
            ApplicationVersion::new(Environment::Acceptance, SNAPSHOT, git.branch.clone())
        }
        None => ApplicationVersion::new(Environment::Development, git.short_hash.clone(), git.branch.clone()),
    }
}

/// Strategy mapping config and git state to an application version
#[async_trait]
pub trait EnvironmentLogic: Send + Sync {
    async fn resolve(&self, config: &Value, git: &GitState) -> Result<ApplicationVersion>;
}

/// The built-in tag/trunk/hash policy
#[derive(Debug, Clone, Default)]
pub struct DefaultEnvironmentLogic;

#[async_trait]
impl EnvironmentLogic for DefaultEnvironmentLogic {
    async fn resolve(&self, _config: &Value, git: &GitState) -> Result<ApplicationVersion> {
        Ok(resolve(git))
    }
}

/// Adapter for a plugin's `deploy_env_logic`
#[derive(Debug, Clone)]
pub struct PluginEnvironmentLogic {
    function: PluginFunction,
}

#[async_trait]
impl EnvironmentLogic for PluginEnvironmentLogic {
    async fn resolve(&self, config: &Value, git: &GitState) -> Result<ApplicationVersion> {
        self.function
            .call_as(json!({ "config": config, "git": git }))
            .await
    }
}

/// Environment logic resolved once against the plugin registry
#[derive(Clone)]
pub struct EnvironmentResolver {
    logic: Arc<dyn EnvironmentLogic>,
}

impl EnvironmentResolver {
    pub fn new(registry: &PluginRegistry) -> Self {
        let logic = registry.default_or_plugin(
            DEPLOY_ENV_LOGIC,
            Arc::new(DefaultEnvironmentLogic) as Arc<dyn EnvironmentLogic>,
            |function| Arc::new(PluginEnvironmentLogic { function }) as Arc<dyn EnvironmentLogic>,
        );

        Self { logic }
    }

    /// Resolve the version for this run
    pub async fn resolve(&self, config: &Value, git: &GitState) -> Result<ApplicationVersion> {
        let version = self.logic.resolve(config, git).await?;
        info!(%version, "Resolved application version");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_means_production() {
        let version = resolve(&GitState::new("feature/x", Some("v1.2.0".into()), "abc123"));

        assert_eq!(version.environment(), Environment::Production);
        assert_eq!(version.version(), "v1.2.0");
        assert_eq!(version.branch(), "feature/x");
    }

    #[test]
    fn test_master_means_acceptance() {
        let version = resolve(&GitState::new("master", None, "abc123"));

        assert_eq!(version.environment(), Environment::Acceptance);
        assert_eq!(version.version(), SNAPSHOT);
    }

    #[test]
    fn test_other_branch_means_development() {
        let version = resolve(&GitState::new("main", None, "abc123"));

        assert_eq!(version.environment(), Environment::Development);
        assert_eq!(version.version(), "abc123");
        assert_eq!(version.environment_formatted(), "dev");
    }

    #[test]
    fn test_empty_branch_is_development() {
        let version = resolve(&GitState::new("", None, "def456"));

        assert_eq!(version.environment(), Environment::Development);
        assert_eq!(version.branch(), "");
    }
}
