//! Databricks secret scopes (REST API 2.0).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::credentials::DatabricksCredentials;
use super::SecretStore;
use crate::domain::Secret;

#[derive(Debug, Deserialize)]
struct ScopeList {
    #[serde(default)]
    scopes: Vec<Scope>,
}

#[derive(Debug, Deserialize)]
struct Scope {
    name: String,
}

/// Secret store backed by a Databricks workspace
pub struct DatabricksSecretStore {
    credentials: DatabricksCredentials,
    client: reqwest::Client,
}

impl DatabricksSecretStore {
    pub fn new(credentials: DatabricksCredentials) -> Self {
        Self {
            credentials,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/2.0/secrets/{}",
            self.credentials.host.trim_end_matches('/'),
            path
        )
    }
}

#[async_trait]
impl SecretStore for DatabricksSecretStore {
    async fn list_scopes(&self) -> Result<Vec<String>> {
        let list: ScopeList = self
            .client
            .get(self.api_url("scopes/list"))
            .bearer_auth(&self.credentials.token)
            .send()
            .await
            .context("Failed to list Databricks secret scopes")?
            .error_for_status()
            .context("Listing Databricks secret scopes was rejected")?
            .json()
            .await
            .context("Failed to parse Databricks scope list")?;

        Ok(list.scopes.into_iter().map(|s| s.name).collect())
    }

    async fn create_scope(&self, scope: &str) -> Result<()> {
        self.client
            .post(self.api_url("scopes/create"))
            .bearer_auth(&self.credentials.token)
            .json(&json!({ "scope": scope }))
            .send()
            .await
            .with_context(|| format!("Failed to create Databricks scope '{}'", scope))?
            .error_for_status()
            .with_context(|| format!("Creating Databricks scope '{}' was rejected", scope))?;

        Ok(())
    }

    async fn put_secret(&self, scope: &str, secret: &Secret) -> Result<()> {
        self.client
            .post(self.api_url("put"))
            .bearer_auth(&self.credentials.token)
            .json(&json!({
                "scope": scope,
                "key": secret.name,
                "string_value": secret.expose(),
            }))
            .send()
            .await
            .with_context(|| format!("Failed to put secret '{}' in scope '{}'", secret.name, scope))?
            .error_for_status()
            .with_context(|| format!("Putting secret '{}' in scope '{}' was rejected", secret.name, scope))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let store = DatabricksSecretStore::new(DatabricksCredentials {
            host: "https://adb-1.azuredatabricks.net/".to_string(),
            token: "t".to_string(),
        });

        assert_eq!(
            store.api_url("scopes/list"),
            "https://adb-1.azuredatabricks.net/api/2.0/secrets/scopes/list"
        );
    }

    #[test]
    fn test_scope_list_parsing() {
        let list: ScopeList =
            serde_json::from_str(r#"{"scopes": [{"name": "foo", "backend_type": "DATABRICKS"}, {"name": "bar"}]}"#)
                .unwrap();
        let names: Vec<String> = list.scopes.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["foo", "bar"]);

        // An empty workspace omits the key entirely
        let empty: ScopeList = serde_json::from_str("{}").unwrap();
        assert!(empty.scopes.is_empty());
    }
}
