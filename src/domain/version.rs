//! Application version: which environment a run deploys to, and as what.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment stage a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    /// Tagged release
    #[serde(rename = "PRD", alias = "PRODUCTION", alias = "prd")]
    Production,

    /// Trunk build
    #[serde(rename = "ACP", alias = "ACCEPTANCE", alias = "acp")]
    Acceptance,

    /// Any other branch
    #[serde(rename = "DEV", alias = "DEVELOPMENT", alias = "dev")]
    Development,
}

impl Environment {
    /// Short upper-case tag ("PRD", "ACP", "DEV")
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Production => "PRD",
            Self::Acceptance => "ACP",
            Self::Development => "DEV",
        }
    }

    /// Lower-case form substituted into resource names
    pub fn formatted(&self) -> &'static str {
        match self {
            Self::Production => "prd",
            Self::Acceptance => "acp",
            Self::Development => "dev",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Marker version used for trunk builds
pub const SNAPSHOT: &str = "SNAPSHOT";

/// The resolved {environment, version, branch} triple for one pipeline run.
///
/// Fields are private so the value cannot change after resolution; steps and
/// naming functions only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationVersion {
    environment: Environment,
    version: String,
    branch: String,
}

impl ApplicationVersion {
    pub fn new(environment: Environment, version: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            environment,
            version: version.into(),
            branch: branch.into(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Release tag, `SNAPSHOT`, or a short commit hash
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Lower-case environment used in generated names (e.g. "dev")
    pub fn environment_formatted(&self) -> &'static str {
        self.environment.formatted()
    }
}

impl fmt::Display for ApplicationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} version={} branch={}",
            self.environment, self.version, self.branch
        )
    }
}
