//! Azure Key Vault secret reader.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::VaultReader;
use crate::domain::Secret;

const API_VERSION: &str = "7.4";

#[derive(Debug, Deserialize)]
struct SecretListPage {
    #[serde(default)]
    value: Vec<SecretItem>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecretItem {
    /// e.g. `https://kv-dev.vault.azure.net/secrets/shop-db-password`
    id: String,
}

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: String,
}

/// Reader for one Key Vault
pub struct KeyVaultClient {
    vault_url: String,
    token: String,
    client: reqwest::Client,
}

impl KeyVaultClient {
    pub fn new(vault_name: &str, token: String) -> Self {
        Self {
            vault_url: format!("https://{}.vault.azure.net", vault_name),
            token,
            client: reqwest::Client::new(),
        }
    }
}

/// Secret name from a Key Vault secret id
fn secret_name(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}

#[async_trait]
impl VaultReader for KeyVaultClient {
    async fn list_secret_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut next = Some(format!("{}/secrets?api-version={}", self.vault_url, API_VERSION));

        while let Some(url) = next {
            let page: SecretListPage = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .with_context(|| format!("Failed to list secrets in {}", self.vault_url))?
                .error_for_status()
                .with_context(|| format!("Listing secrets in {} was rejected", self.vault_url))?
                .json()
                .await
                .context("Failed to parse Key Vault secret list")?;

            names.extend(page.value.iter().map(|item| secret_name(&item.id).to_string()));
            next = page.next_link;
        }

        Ok(names)
    }

    async fn get_secret(&self, name: &str) -> Result<Secret> {
        let bundle: SecretBundle = self
            .client
            .get(format!("{}/secrets/{}?api-version={}", self.vault_url, name, API_VERSION))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Failed to read secret '{}'", name))?
            .error_for_status()
            .with_context(|| format!("Reading secret '{}' was rejected", name))?
            .json()
            .await
            .with_context(|| format!("Failed to parse secret '{}'", name))?;

        Ok(Secret::new(name, bundle.value))
    }
}
