//! Configuration errors.
//!
//! These are fatal: they surface before (or instead of) any provisioning
//! work and always name the offending key, path or task. Provider failures are
//! not represented here; they travel as plain `anyhow` errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Deployment step '{task}' is unknown, please check the config")]
    UnknownTask { task: String },

    #[error("Missing required config key '{key}'")]
    MissingKey { key: String },

    #[error("Plugin path '{}' does not resolve to a plugin: {reason}", path.display())]
    PluginPath { path: PathBuf, reason: String },

    #[error("Invalid plugin manifest '{}': {reason}", path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Invalid naming template '{template}' at '{key}': {reason}")]
    InvalidTemplate {
        key: String,
        template: String,
        reason: String,
    },

    #[error("Plugin '{plugin}' does not provide symbol '{symbol}'")]
    MissingSymbol { plugin: String, symbol: String },

    #[error("Plugin '{plugin}' returned invalid output for '{symbol}': {reason}")]
    InvalidPluginOutput {
        plugin: String,
        symbol: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }
}
