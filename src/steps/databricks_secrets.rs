//! Copy application secrets from the environment's key vault into the
//! application's Databricks secret scope.
//!
//! Vault secrets are selected by the `<application_name>-` prefix; the rest of
//! the name becomes the key inside the scope. With application `shop`:
//!
//! | Vault secret | Scope key |
//! |--------------|-----------|
//! | `shop-db-password` | `db-password` |
//! | `shopfront-token` | (skipped) |

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{Step, StepContext};
use crate::core::reconcile::propagate_secrets;
use crate::domain::Secret;

pub const TASK: &str = "create_databricks_secrets";

/// A vault secret selected for the application scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSecretKey {
    /// Name in the vault
    pub vault_name: String,
    /// Key in the secret scope
    pub scope_key: String,
}

/// Keep names starting with `<prefix>-` and strip that prefix
pub fn filter_vault_names(names: &[String], prefix: &str) -> Vec<VaultSecretKey> {
    let prefix = format!("{}-", prefix);

    names
        .iter()
        .filter_map(|name| {
            let key = name.strip_prefix(&prefix)?;
            (!key.is_empty()).then(|| VaultSecretKey {
                vault_name: name.clone(),
                scope_key: key.to_string(),
            })
        })
        .collect()
}

pub struct CreateDatabricksSecrets {
    ctx: StepContext,
    application_name: String,
}

impl CreateDatabricksSecrets {
    pub fn new(ctx: StepContext) -> Result<Self> {
        let application_name = ctx.config.require_str("application_name")?.to_string();
        Ok(Self {
            ctx,
            application_name,
        })
    }
}

#[async_trait]
impl Step for CreateDatabricksSecrets {
    async fn run(&self) -> Result<()> {
        let version = &self.ctx.version;
        let config = self.ctx.config.to_value();

        let vault_name = self.ctx.naming.keyvault_name(&config, version).await?;
        let vault = self.ctx.platform.vault(version, &vault_name)?;

        let names = vault.list_secret_names().await?;
        let selected = filter_vault_names(&names, &self.application_name);
        info!(vault = %vault_name, selected = selected.len(), "Selected vault secrets");

        let mut secrets = Vec::with_capacity(selected.len());
        for key in selected {
            let secret = vault.get_secret(&key.vault_name).await?;
            secrets.push(Secret::new(key.scope_key, secret.expose()));
        }

        let store = self.ctx.platform.secret_store(version)?;
        propagate_secrets(store.as_ref(), &self.application_name, &secrets).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn keys(selected: &[VaultSecretKey]) -> Vec<&str> {
        selected.iter().map(|k| k.scope_key.as_str()).collect()
    }

    #[test]
    fn test_filter_by_application_prefix() {
        let ids = names(&["app-foo-key1", "appfoo-key2", "app-bar-key3", "app-key4"]);

        let selected = filter_vault_names(&ids, "app");
        assert_eq!(keys(&selected), vec!["foo-key1", "bar-key3", "key4"]);
        assert_eq!(selected[0].vault_name, "app-foo-key1");

        let selected = filter_vault_names(&ids, "app-foo");
        assert_eq!(keys(&selected), vec!["key1"]);
    }

    #[test]
    fn test_bare_prefix_is_skipped() {
        let selected = filter_vault_names(&names(&["app-", "app"]), "app");
        assert!(selected.is_empty());
    }
}
