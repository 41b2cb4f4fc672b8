//! Executor Integration Tests
//!
//! Tests for task validation, config merging and fail-fast ordering.

mod common;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use common::{map, FakePlatform};
use runway::domain::ConfigMap;
use runway::{
    ApplicationVersion, ConfigError, Environment, Executor, NamingResolver, PluginRegistry, Step,
    StepContext, StepRegistry,
};

type Log = Arc<Mutex<Vec<String>>>;

/// Step that records its task when run
struct Recording {
    task: String,
    log: Log,
    fail: bool,
}

#[async_trait]
impl Step for Recording {
    async fn run(&self) -> Result<()> {
        self.log.lock().unwrap().push(self.task.clone());
        if self.fail {
            anyhow::bail!("{} failed", self.task);
        }
        Ok(())
    }
}

fn recording_registry(tasks: &[&str], failing: &[&str], log: &Log, seen: &Arc<Mutex<Vec<Value>>>) -> StepRegistry {
    let mut registry = StepRegistry::new();
    for &task in tasks {
        let log = Arc::clone(log);
        let seen = Arc::clone(seen);
        let fail = failing.contains(&task);
        registry = registry.with(task, move |ctx: StepContext| {
            seen.lock().unwrap().push(ctx.config.to_value());
            Ok(Box::new(Recording {
                task: ctx.config.task().to_string(),
                log: Arc::clone(&log),
                fail,
            }) as Box<dyn Step>)
        });
    }
    registry
}

fn executor(registry: StepRegistry) -> Executor {
    Executor::new(
        registry,
        Arc::new(NamingResolver::new(&PluginRegistry::empty())),
        Arc::new(FakePlatform::default()),
    )
}

fn dev() -> ApplicationVersion {
    ApplicationVersion::new(Environment::Development, "abc123", "feature/x")
}

fn steps(values: Vec<Value>) -> Vec<ConfigMap> {
    values.into_iter().map(map).collect()
}

#[tokio::test]
async fn test_unknown_task_runs_nothing() {
    let log = Log::default();
    let seen = Arc::default();
    let executor = executor(recording_registry(&["a"], &[], &log, &seen));

    let pipeline = steps(vec![json!({"task": "a"}), json!({"task": "unknown_task"}), json!({"task": "a"})]);
    let err = executor.run(&dev(), &pipeline, &ConfigMap::new()).await.unwrap_err();

    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::UnknownTask { task }) => assert_eq!(task, "unknown_task"),
        other => panic!("expected UnknownTask, got {:?}", other),
    }
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_descriptor_without_task_is_rejected() {
    let log = Log::default();
    let seen = Arc::default();
    let executor = executor(recording_registry(&["a"], &[], &log, &seen));

    let pipeline = steps(vec![json!({"task": "a"}), json!({"application_name": "shop"})]);
    let err = executor.check(&pipeline).unwrap_err();

    assert!(matches!(err, ConfigError::MissingKey { ref key } if key == "task"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_step_field_overrides_global() {
    let log = Log::default();
    let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
    let executor = executor(recording_registry(&["t"], &[], &log, &seen));

    let global = map(json!({"x": 1, "region": "westeurope"}));
    let pipeline = steps(vec![json!({"task": "t", "x": 2})]);

    executor.run(&dev(), &pipeline, &global).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["x"], json!(2));
    assert_eq!(seen[0]["region"], json!("westeurope"));
    assert_eq!(seen[0]["task"], json!("t"));
}

#[tokio::test]
async fn test_global_config_is_not_shared_between_steps() {
    let log = Log::default();
    let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
    let executor = executor(recording_registry(&["a", "b"], &[], &log, &seen));

    let global = map(json!({"x": 1}));
    let pipeline = steps(vec![json!({"task": "a", "x": 2}), json!({"task": "b"})]);

    executor.run(&dev(), &pipeline, &global).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["x"], json!(2));
    assert_eq!(seen[1]["x"], json!(1));
}

#[tokio::test]
async fn test_failing_step_stops_pipeline() {
    let log = Log::default();
    let seen = Arc::default();
    let executor = executor(recording_registry(&["a", "b", "c"], &["b"], &log, &seen));

    let pipeline = steps(vec![json!({"task": "a"}), json!({"task": "b"}), json!({"task": "c"})]);
    let err = executor.run(&dev(), &pipeline, &ConfigMap::new()).await.unwrap_err();

    // The step's own error comes back unchanged
    assert_eq!(err.to_string(), "b failed");
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_successful_run_reports_completed_tasks() {
    let log = Log::default();
    let seen = Arc::default();
    let executor = executor(recording_registry(&["a", "b"], &[], &log, &seen));

    let pipeline = steps(vec![json!({"task": "b"}), json!({"task": "a"}), json!({"task": "b"})]);
    let run = executor.run(&dev(), &pipeline, &ConfigMap::new()).await.unwrap();

    assert_eq!(run.completed, vec!["b", "a", "b"]);
    assert_eq!(run.version, dev());
    assert_eq!(*log.lock().unwrap(), vec!["b", "a", "b"]);
}

#[tokio::test]
async fn test_empty_pipeline_succeeds() {
    let executor = executor(StepRegistry::builtin());

    let run = executor.run(&dev(), &[], &ConfigMap::new()).await.unwrap();
    assert!(run.completed.is_empty());
}

#[tokio::test]
async fn test_step_construction_error_stops_pipeline() {
    let executor = executor(StepRegistry::builtin());

    // create_application_insights needs an application_name
    let pipeline = steps(vec![json!({"task": "create_application_insights"})]);
    let err = executor.run(&dev(), &pipeline, &ConfigMap::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingKey { key }) if key == "application_name"
    ));
}

#[tokio::test]
async fn test_construction_failure_runs_no_step() {
    let log = Log::default();
    let seen = Arc::default();
    let registry = recording_registry(&["a"], &[], &log, &seen)
        .with("picky", |ctx: StepContext| {
            ctx.config.require_str("target")?;
            Ok(Box::new(Recording {
                task: "picky".to_string(),
                log: Log::default(),
                fail: false,
            }) as Box<dyn Step>)
        });
    let executor = executor(registry);

    let pipeline = steps(vec![json!({"task": "a"}), json!({"task": "a"}), json!({"task": "picky"})]);
    let err = executor.run(&dev(), &pipeline, &ConfigMap::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingKey { key }) if key == "target"
    ));
    assert!(log.lock().unwrap().is_empty());
}
