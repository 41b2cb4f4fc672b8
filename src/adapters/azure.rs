//! Azure + Databricks platform.

use std::sync::Arc;

use anyhow::Result;

use super::credentials::CredentialProvider;
use super::{
    ApplicationInsightsClient, DatabricksSecretStore, InsightsProvider, KeyVaultClient, Platform,
    SecretStore, VaultReader,
};
use crate::config::Settings;
use crate::core::error::ConfigError;
use crate::domain::ApplicationVersion;

/// Hands out REST clients authenticated for the run's environment
pub struct AzurePlatform {
    subscription_id: Option<String>,
    location: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl AzurePlatform {
    pub fn new(settings: &Settings, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            subscription_id: settings.azure().subscription_id.clone(),
            location: settings.azure().location.clone(),
            credentials,
        }
    }
}

impl Platform for AzurePlatform {
    fn insights(&self, version: &ApplicationVersion) -> Result<Arc<InsightsProvider>> {
        // Only steps touching ARM need a subscription
        let subscription_id = self
            .subscription_id
            .clone()
            .ok_or_else(|| ConfigError::missing_key("azure.subscription_id"))?;
        let token = self.credentials.azure_token(version.environment())?;

        Ok(Arc::new(ApplicationInsightsClient::new(
            token,
            subscription_id,
            self.location.clone(),
        )))
    }

    fn secret_store(&self, version: &ApplicationVersion) -> Result<Arc<dyn SecretStore>> {
        let credentials = self.credentials.databricks(version.environment())?;
        Ok(Arc::new(DatabricksSecretStore::new(credentials)))
    }

    fn vault(&self, version: &ApplicationVersion, vault_name: &str) -> Result<Arc<dyn VaultReader>> {
        let token = self.credentials.keyvault_token(version.environment())?;
        Ok(Arc::new(KeyVaultClient::new(vault_name, token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DatabricksCredentials;
    use crate::domain::Environment;

    struct StaticCredentials;

    impl CredentialProvider for StaticCredentials {
        fn azure_token(&self, _: Environment) -> Result<String> {
            Ok("arm".to_string())
        }

        fn keyvault_token(&self, _: Environment) -> Result<String> {
            Ok("kv".to_string())
        }

        fn databricks(&self, _: Environment) -> Result<DatabricksCredentials> {
            Ok(DatabricksCredentials {
                host: "https://adb".to_string(),
                token: "dapi".to_string(),
            })
        }
    }

    #[test]
    fn test_insights_requires_subscription() {
        let platform = AzurePlatform::new(&Settings::default(), Arc::new(StaticCredentials));
        let version = ApplicationVersion::new(Environment::Development, "abc", "x");

        let err = platform.insights(&version).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingKey { key }) if key == "azure.subscription_id"
        ));

        assert!(platform.secret_store(&version).is_ok());
        assert!(platform.vault(&version, "kv-dev").is_ok());
    }
}
