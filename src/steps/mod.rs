//! Provisioning steps and the task registry.
//!
//! A step is constructed from a [`StepContext`] (version, merged config,
//! naming resolver, platform) and then run once. Every step must be
//! idempotent: re-running the whole pipeline is the recovery mechanism.

pub mod application_insights;
pub mod databricks_secrets;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::adapters::Platform;
use crate::core::error::ConfigError;
use crate::core::naming::NamingResolver;
use crate::domain::{ApplicationVersion, StepConfig};

pub use application_insights::CreateApplicationInsights;
pub use databricks_secrets::CreateDatabricksSecrets;

/// Everything a step is constructed with
#[derive(Clone)]
pub struct StepContext {
    pub version: ApplicationVersion,
    pub config: StepConfig,
    pub naming: Arc<NamingResolver>,
    pub platform: Arc<dyn Platform>,
}

/// One unit of provisioning work
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Builds a configured step from its context
pub type StepFactory = Arc<dyn Fn(StepContext) -> Result<Box<dyn Step>> + Send + Sync>;

/// Task name -> step factory, fixed before the pipeline starts
#[derive(Clone, Default)]
pub struct StepRegistry {
    factories: BTreeMap<String, StepFactory>,
}

impl StepRegistry {
    /// A registry without any tasks
    pub fn new() -> Self {
        Self::default()
    }

    /// The steps shipped with runway
    pub fn builtin() -> Self {
        Self::new()
            .with(application_insights::TASK, |ctx| {
                Ok(Box::new(CreateApplicationInsights::new(ctx)?) as Box<dyn Step>)
            })
            .with(databricks_secrets::TASK, |ctx| {
                Ok(Box::new(CreateDatabricksSecrets::new(ctx)?) as Box<dyn Step>)
            })
    }

    /// Register `task`, replacing any previous factory for it
    pub fn with<F>(mut self, task: impl Into<String>, factory: F) -> Self
    where
        F: Fn(StepContext) -> Result<Box<dyn Step>> + Send + Sync + 'static,
    {
        self.factories.insert(task.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, task: &str) -> bool {
        self.factories.contains_key(task)
    }

    /// Registered task names, sorted
    pub fn tasks(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Construct the step for `ctx.config.task()`
    pub fn create(&self, ctx: StepContext) -> Result<Box<dyn Step>> {
        let factory = self
            .factories
            .get(ctx.config.task())
            .ok_or_else(|| ConfigError::UnknownTask {
                task: ctx.config.task().to_string(),
            })?;

        factory(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl Step for Noop {
        async fn run(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_builtin_tasks() {
        let registry = StepRegistry::builtin();
        assert_eq!(
            registry.tasks(),
            vec!["create_application_insights", "create_databricks_secrets"]
        );
    }

    #[test]
    fn test_register_custom_task() {
        let registry = StepRegistry::new().with("noop", |_| Ok(Box::new(Noop) as Box<dyn Step>));

        assert!(registry.contains("noop"));
        assert!(!registry.contains("create_application_insights"));
    }
}
