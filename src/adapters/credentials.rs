//! Credential lookup per environment.
//!
//! Acquiring tokens (service principals, AD users) happens outside runway.
//! The shipped provider reads already-issued tokens from the environment:
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `AZURE_TOKEN_<ENV>` | Bearer token for Azure Resource Manager |
//! | `KEYVAULT_TOKEN_<ENV>` | Bearer token for Key Vault (falls back to the ARM token) |
//! | `DATABRICKS_HOST_<ENV>` | Databricks workspace URL |
//! | `DATABRICKS_TOKEN_<ENV>` | Databricks personal access token |
//!
//! `<ENV>` is the environment tag (`PRD`, `ACP`, `DEV`).

use anyhow::{Context, Result};

use crate::domain::Environment;

/// Databricks workspace access
#[derive(Clone)]
pub struct DatabricksCredentials {
    pub host: String,
    pub token: String,
}

impl std::fmt::Debug for DatabricksCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabricksCredentials")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of credentials for an environment
pub trait CredentialProvider: Send + Sync {
    fn azure_token(&self, environment: Environment) -> Result<String>;

    fn keyvault_token(&self, environment: Environment) -> Result<String>;

    fn databricks(&self, environment: Environment) -> Result<DatabricksCredentials>;
}

/// Reads credentials from environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    fn var(prefix: &str, environment: Environment) -> Result<String> {
        let name = variable_name(prefix, environment);
        std::env::var(&name).with_context(|| format!("Environment variable {} is not set", name))
    }
}

impl CredentialProvider for EnvCredentials {
    fn azure_token(&self, environment: Environment) -> Result<String> {
        Self::var("AZURE_TOKEN", environment)
    }

    fn keyvault_token(&self, environment: Environment) -> Result<String> {
        Self::var("KEYVAULT_TOKEN", environment).or_else(|_| self.azure_token(environment))
    }

    fn databricks(&self, environment: Environment) -> Result<DatabricksCredentials> {
        Ok(DatabricksCredentials {
            host: Self::var("DATABRICKS_HOST", environment)?,
            token: Self::var("DATABRICKS_TOKEN", environment)?,
        })
    }
}

/// `<prefix>_<TAG>`, e.g. `AZURE_TOKEN_DEV`
pub fn variable_name(prefix: &str, environment: Environment) -> String {
    format!("{}_{}", prefix, environment.tag())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_name() {
        assert_eq!(variable_name("AZURE_TOKEN", Environment::Production), "AZURE_TOKEN_PRD");
        assert_eq!(
            variable_name("DATABRICKS_HOST", Environment::Development),
            "DATABRICKS_HOST_DEV"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = DatabricksCredentials {
            host: "https://adb.example.net".to_string(),
            token: "dapi-secret".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("adb.example.net"));
        assert!(!rendered.contains("dapi-secret"));
    }
}
