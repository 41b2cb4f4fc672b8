//! Application Insights components via Azure Resource Manager.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NamedResource, ResourceProvider};

/// Azure Resource Manager endpoint
pub const MANAGEMENT_URL: &str = "https://management.azure.com";

const API_VERSION: &str = "2015-05-01";

/// An Application Insights component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsComponent {
    pub id: Option<String>,
    pub name: String,
    pub location: String,
    pub instrumentation_key: Option<String>,
}

impl NamedResource for InsightsComponent {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Component as returned by ARM
#[derive(Debug, Deserialize)]
struct ComponentResource {
    id: Option<String>,
    name: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    properties: ComponentProperties,
}

#[derive(Debug, Default, Deserialize)]
struct ComponentProperties {
    #[serde(rename = "InstrumentationKey")]
    instrumentation_key: Option<String>,
}

impl From<ComponentResource> for InsightsComponent {
    fn from(resource: ComponentResource) -> Self {
        Self {
            id: resource.id,
            name: resource.name,
            location: resource.location,
            instrumentation_key: resource.properties.instrumentation_key,
        }
    }
}

/// One page of an ARM list response
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    value: Vec<ComponentResource>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

/// Application Insights management client for one subscription
pub struct ApplicationInsightsClient {
    /// Bearer token for ARM
    token: String,
    subscription_id: String,
    /// Region for created components
    location: String,
    base_url: String,
    client: reqwest::Client,
}

impl ApplicationInsightsClient {
    pub fn new(token: String, subscription_id: String, location: String) -> Self {
        Self {
            token,
            subscription_id,
            location,
            base_url: MANAGEMENT_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at another ARM endpoint (sovereign clouds)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn list_url(&self) -> String {
        format!(
            "{}/subscriptions/{}/providers/Microsoft.Insights/components?api-version={}",
            self.base_url, self.subscription_id, API_VERSION
        )
    }

    fn component_url(&self, resource_group: &str, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Insights/components/{}?api-version={}",
            self.base_url, self.subscription_id, resource_group, name, API_VERSION
        )
    }
}

#[async_trait]
impl ResourceProvider for ApplicationInsightsClient {
    type Resource = InsightsComponent;

    async fn list(&self) -> Result<Vec<InsightsComponent>> {
        let mut components = Vec::new();
        let mut next = Some(self.list_url());

        while let Some(url) = next {
            let page: ListPage = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .context("Failed to list Application Insights components")?
                .error_for_status()
                .context("Listing Application Insights components was rejected")?
                .json()
                .await
                .context("Failed to parse Application Insights component list")?;

            debug!(count = page.value.len(), "Listed Application Insights page");
            components.extend(page.value.into_iter().map(InsightsComponent::from));
            next = page.next_link;
        }

        Ok(components)
    }

    async fn create(&self, resource_group: &str, name: &str) -> Result<InsightsComponent> {
        let resource: ComponentResource = self
            .client
            .put(self.component_url(resource_group, name))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "location": self.location,
                "kind": "other",
                "properties": { "Application_Type": "other" },
            }))
            .send()
            .await
            .with_context(|| format!("Failed to create Application Insights '{}'", name))?
            .error_for_status()
            .with_context(|| format!("Creating Application Insights '{}' was rejected", name))?
            .json()
            .await
            .context("Failed to parse created Application Insights component")?;

        Ok(resource.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = ApplicationInsightsClient::new(
            "token".to_string(),
            "sub-1".to_string(),
            "westeurope".to_string(),
        );

        assert_eq!(
            client.list_url(),
            "https://management.azure.com/subscriptions/sub-1/providers/Microsoft.Insights/components?api-version=2015-05-01"
        );
        assert_eq!(
            client.component_url("rg-dev", "shop"),
            "https://management.azure.com/subscriptions/sub-1/resourceGroups/rg-dev/providers/Microsoft.Insights/components/shop?api-version=2015-05-01"
        );
    }

    #[test]
    fn test_component_from_arm_json() {
        let page: ListPage = serde_json::from_str(
            r#"{
                "value": [{
                    "id": "/subscriptions/sub-1/resourceGroups/rg-dev/providers/Microsoft.Insights/components/shop",
                    "name": "shop",
                    "location": "westeurope",
                    "properties": {"InstrumentationKey": "ikey-1"}
                }],
                "nextLink": null
            }"#,
        )
        .unwrap();

        let component = InsightsComponent::from(page.value.into_iter().next().unwrap());
        assert_eq!(component.name, "shop");
        assert_eq!(component.instrumentation_key.as_deref(), Some("ikey-1"));
        assert!(page.next_link.is_none());
    }
}
