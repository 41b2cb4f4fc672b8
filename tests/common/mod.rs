//! In-memory platform used by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use runway::adapters::{
    InsightsComponent, InsightsProvider, Platform, ResourceProvider, SecretStore, VaultReader,
};
use runway::{ApplicationVersion, Secret};

/// Application Insights fake recording creations
#[derive(Default)]
pub struct FakeInsights {
    pub components: Mutex<Vec<InsightsComponent>>,
    pub creations: AtomicUsize,
    pub fail_listing: bool,
}

impl FakeInsights {
    pub fn with_components(components: Vec<InsightsComponent>) -> Self {
        Self {
            components: Mutex::new(components),
            ..Default::default()
        }
    }

    pub fn creation_count(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}

pub fn component(name: &str, key: &str) -> InsightsComponent {
    InsightsComponent {
        id: Some(format!("/components/{}", name)),
        name: name.to_string(),
        location: "westeurope".to_string(),
        instrumentation_key: Some(key.to_string()),
    }
}

#[async_trait]
impl ResourceProvider for FakeInsights {
    type Resource = InsightsComponent;

    async fn list(&self) -> Result<Vec<InsightsComponent>> {
        if self.fail_listing {
            anyhow::bail!("provider unavailable");
        }
        Ok(self.components.lock().unwrap().clone())
    }

    async fn create(&self, namespace: &str, name: &str) -> Result<InsightsComponent> {
        let n = self.creations.fetch_add(1, Ordering::SeqCst) + 1;
        let created = InsightsComponent {
            id: Some(format!("/resourceGroups/{}/components/{}", namespace, name)),
            name: name.to_string(),
            location: "westeurope".to_string(),
            instrumentation_key: Some(format!("ikey-{}", n)),
        };
        self.components.lock().unwrap().push(created.clone());
        Ok(created)
    }
}

/// Secret scopes kept in memory
#[derive(Default)]
pub struct FakeSecretStore {
    pub scopes: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
    pub scope_creations: AtomicUsize,
}

impl FakeSecretStore {
    pub fn secret(&self, scope: &str, key: &str) -> Option<String> {
        self.scopes
            .lock()
            .unwrap()
            .get(scope)
            .and_then(|s| s.get(key).cloned())
    }

    pub fn keys(&self, scope: &str) -> Vec<String> {
        self.scopes
            .lock()
            .unwrap()
            .get(scope)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn list_scopes(&self) -> Result<Vec<String>> {
        Ok(self.scopes.lock().unwrap().keys().cloned().collect())
    }

    async fn create_scope(&self, scope: &str) -> Result<()> {
        self.scope_creations.fetch_add(1, Ordering::SeqCst);
        let mut scopes = self.scopes.lock().unwrap();
        if scopes.contains_key(scope) {
            anyhow::bail!("scope '{}' already exists", scope);
        }
        scopes.insert(scope.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn put_secret(&self, scope: &str, secret: &Secret) -> Result<()> {
        let mut scopes = self.scopes.lock().unwrap();
        let entries = scopes
            .get_mut(scope)
            .ok_or_else(|| anyhow::anyhow!("scope '{}' does not exist", scope))?;
        entries.insert(secret.name.clone(), secret.expose().to_string());
        Ok(())
    }
}

/// Key vault fake
#[derive(Default)]
pub struct FakeVault {
    pub secrets: BTreeMap<String, String>,
}

#[async_trait]
impl VaultReader for FakeVault {
    async fn list_secret_names(&self) -> Result<Vec<String>> {
        Ok(self.secrets.keys().cloned().collect())
    }

    async fn get_secret(&self, name: &str) -> Result<Secret> {
        let value = self
            .secrets
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("secret '{}' not found", name))?;
        Ok(Secret::new(name, value.clone()))
    }
}

/// Platform handing out the shared fakes
#[derive(Default)]
pub struct FakePlatform {
    pub insights: Arc<FakeInsights>,
    pub store: Arc<FakeSecretStore>,
    pub vault: Arc<FakeVault>,
    /// Vault names requested by steps
    pub requested_vaults: Mutex<Vec<String>>,
}

impl Platform for FakePlatform {
    fn insights(&self, _version: &ApplicationVersion) -> Result<Arc<InsightsProvider>> {
        Ok(self.insights.clone())
    }

    fn secret_store(&self, _version: &ApplicationVersion) -> Result<Arc<dyn SecretStore>> {
        Ok(self.store.clone())
    }

    fn vault(&self, _version: &ApplicationVersion, vault_name: &str) -> Result<Arc<dyn VaultReader>> {
        self.requested_vaults.lock().unwrap().push(vault_name.to_string());
        Ok(self.vault.clone())
    }
}

/// JSON object literal as a config map
pub fn map(value: serde_json::Value) -> runway::domain::ConfigMap {
    value.as_object().cloned().expect("expected a JSON object")
}
