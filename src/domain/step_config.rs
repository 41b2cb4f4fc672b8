//! Merged per-step configuration.

use serde_json::{Map, Value};

use crate::core::error::ConfigError;

/// A step descriptor or a settings document: a YAML mapping as JSON.
pub type ConfigMap = Map<String, Value>;

/// Configuration seen by one step: global settings overlaid with the step's
/// own fields. A key present in both resolves to the step-local value.
#[derive(Debug, Clone)]
pub struct StepConfig {
    task: String,
    fields: ConfigMap,
}

impl StepConfig {
    /// Merge `global` under `descriptor` (descriptor fields win)
    pub fn merge(global: &ConfigMap, descriptor: &ConfigMap) -> Result<Self, ConfigError> {
        let task = descriptor_task(descriptor)?.to_string();

        let mut fields = global.clone();
        for (key, value) in descriptor {
            fields.insert(key.clone(), value.clone());
        }

        Ok(Self { task, fields })
    }

    /// Name of the step implementation to run
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a string field, failing with the key name when it is absent
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::missing_key(key))
    }

    /// Get a string field or fall back to `default`
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }

    pub fn as_map(&self) -> &ConfigMap {
        &self.fields
    }

    /// The merged fields as a single JSON object (handed to plugins)
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Read the `task` name of a raw step descriptor
pub fn descriptor_task(descriptor: &ConfigMap) -> Result<&str, ConfigError> {
    descriptor
        .get("task")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::missing_key("task"))
}
