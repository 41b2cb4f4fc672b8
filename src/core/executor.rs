//! Sequential, fail-fast pipeline executor.
//!
//! Steps run strictly in declaration order. The first failing step ends the
//! run and its error is returned unchanged; there is no retry, rollback or
//! resume. Every task name is checked against the registry and every step is
//! constructed before the first step starts, so a typo or a missing key never
//! leaves a half-provisioned environment.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::error::ConfigError;
use super::naming::NamingResolver;
use crate::adapters::Platform;
use crate::domain::step_config::descriptor_task;
use crate::domain::{ApplicationVersion, ConfigMap, StepConfig};
use crate::steps::{StepContext, StepRegistry};

/// Outcome of a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: Uuid,
    pub version: ApplicationVersion,
    /// Tasks that ran, in order
    pub completed: Vec<String>,
}

/// Runs a pipeline's steps against one platform
pub struct Executor {
    registry: StepRegistry,
    naming: Arc<NamingResolver>,
    platform: Arc<dyn Platform>,
}

impl Executor {
    pub fn new(registry: StepRegistry, naming: Arc<NamingResolver>, platform: Arc<dyn Platform>) -> Self {
        Self {
            registry,
            naming,
            platform,
        }
    }

    /// Verify every descriptor names a registered task
    pub fn check(&self, steps: &[ConfigMap]) -> Result<(), ConfigError> {
        for step in steps {
            let task = descriptor_task(step)?;
            if !self.registry.contains(task) {
                return Err(ConfigError::UnknownTask {
                    task: task.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Run `steps` in order with `global` config merged under each
    #[instrument(skip_all, fields(version = %version))]
    pub async fn run(
        &self,
        version: &ApplicationVersion,
        steps: &[ConfigMap],
        global: &ConfigMap,
    ) -> Result<PipelineRun> {
        self.check(steps)?;

        let run_id = Uuid::new_v4();
        info!(%run_id, steps = steps.len(), "Starting pipeline");

        // Build every step before running any, so a missing key in a later
        // descriptor fails the run before anything is provisioned
        let mut planned = Vec::with_capacity(steps.len());
        for descriptor in steps {
            let config = StepConfig::merge(global, descriptor)?;
            let task = config.task().to_string();

            let step = self.registry.create(StepContext {
                version: version.clone(),
                config,
                naming: Arc::clone(&self.naming),
                platform: Arc::clone(&self.platform),
            })?;

            planned.push((task, step));
        }

        let mut completed = Vec::with_capacity(planned.len());

        for (idx, (task, step)) in planned.into_iter().enumerate() {
            info!("{}", "*".repeat(76));
            info!(%run_id, step = idx + 1, total = steps.len(), "RUNNING TASK: {}", task);
            info!("{}", "*".repeat(76));

            if let Err(e) = step.run().await {
                error!(%run_id, task = %task, error = %e, "Task failed, stopping pipeline");
                return Err(e);
            }

            completed.push(task);
        }

        info!(%run_id, "Pipeline completed successfully");

        Ok(PipelineRun {
            id: run_id,
            version: version.clone(),
            completed,
        })
    }
}
