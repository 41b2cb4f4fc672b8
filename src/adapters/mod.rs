//! Adapter interfaces for external platforms.
//!
//! Steps never talk to a cloud SDK directly. They get clients from a
//! [`Platform`] for the run's environment and use three narrow capabilities:
//! list/create a named resource, write secrets into a scope, read a vault.

pub mod azure;
pub mod credentials;
pub mod databricks;
pub mod insights;
pub mod keyvault;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ApplicationVersion, Secret};

pub use azure::AzurePlatform;
pub use credentials::{CredentialProvider, DatabricksCredentials, EnvCredentials};
pub use databricks::DatabricksSecretStore;
pub use insights::{ApplicationInsightsClient, InsightsComponent};
pub use keyvault::KeyVaultClient;

/// An external entity identified by a human-readable name
pub trait NamedResource {
    fn name(&self) -> &str;
}

/// A provider that can list and create resources of one type
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    type Resource: NamedResource + Send;

    /// All resources visible to this client, in provider order
    async fn list(&self) -> Result<Vec<Self::Resource>>;

    /// Create `name` in `namespace` with the provider's default attributes
    async fn create(&self, namespace: &str, name: &str) -> Result<Self::Resource>;
}

/// A secrets store organised in named scopes
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn list_scopes(&self) -> Result<Vec<String>>;

    async fn create_scope(&self, scope: &str) -> Result<()>;

    /// Insert or overwrite `secret` in `scope`
    async fn put_secret(&self, scope: &str, secret: &Secret) -> Result<()>;
}

/// Read access to one secrets vault
#[async_trait]
pub trait VaultReader: Send + Sync {
    async fn list_secret_names(&self) -> Result<Vec<String>>;

    async fn get_secret(&self, name: &str) -> Result<Secret>;
}

/// Monitoring-resource provider handed to steps
pub type InsightsProvider = dyn ResourceProvider<Resource = InsightsComponent>;

/// Clients for one target platform, scoped by environment
pub trait Platform: Send + Sync {
    fn insights(&self, version: &ApplicationVersion) -> Result<Arc<InsightsProvider>>;

    fn secret_store(&self, version: &ApplicationVersion) -> Result<Arc<dyn SecretStore>>;

    fn vault(&self, version: &ApplicationVersion, vault_name: &str) -> Result<Arc<dyn VaultReader>>;
}
