//! Monitoring resource step.
//!
//! Ensures an Application Insights component named after the application
//! exists in the environment's resource group, then stores its
//! instrumentation key in the application's secret scope.
//!
//! ```yaml
//! - task: create_application_insights
//!   instrumentation_secret: "instrumentation-key"   # optional
//! ```

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{Step, StepContext};
use crate::core::naming::NameCategory;
use crate::core::reconcile::{ensure_resource, propagate_secrets};
use crate::domain::Secret;

pub const TASK: &str = "create_application_insights";

/// Secret name used when the step does not declare one
pub const DEFAULT_SECRET_NAME: &str = "instrumentation-key";

pub struct CreateApplicationInsights {
    ctx: StepContext,
    application_name: String,
    secret_naming: String,
}

impl CreateApplicationInsights {
    pub fn new(ctx: StepContext) -> Result<Self> {
        let application_name = ctx.config.require_str("application_name")?.to_string();
        let secret_naming = ctx
            .config
            .str_or("instrumentation_secret", DEFAULT_SECRET_NAME)
            .to_string();

        ctx.naming
            .check_template(NameCategory::DatabricksSecret, "instrumentation_secret", &secret_naming)?;

        Ok(Self {
            ctx,
            application_name,
            secret_naming,
        })
    }
}

#[async_trait]
impl Step for CreateApplicationInsights {
    async fn run(&self) -> Result<()> {
        let version = &self.ctx.version;
        let config = self.ctx.config.to_value();

        let resource_group = self.ctx.naming.resource_group_name(&config, version).await?;
        let provider = self.ctx.platform.insights(version)?;

        let component = ensure_resource(provider.as_ref(), &resource_group, &self.application_name).await?;

        let instrumentation_key = component.instrumentation_key.ok_or_else(|| {
            anyhow::anyhow!(
                "Application Insights '{}' has no instrumentation key",
                component.name
            )
        })?;

        let secret_name = self
            .ctx
            .naming
            .databricks_secret_name(&self.secret_naming, version)
            .await?;

        let store = self.ctx.platform.secret_store(version)?;
        propagate_secrets(
            store.as_ref(),
            &self.application_name,
            &[Secret::new(secret_name, instrumentation_key)],
        )
        .await?;

        info!(application = %self.application_name, %resource_group, "Application Insights ready");
        Ok(())
    }
}
