//! Plugin registry for overriding naming and environment logic.
//!
//! A plugin exposes zero or more named functions ("symbols"). Runway asks the
//! registry for a symbol by name; plugins are searched in load order and the
//! first one defining the symbol wins. Partial overrides are the norm.
//!
//! Plugins are loaded once at start-up:
//! 1. Each configured `plugins` path, in order. A path is either a plugin
//!    directory (contains `plugin.yaml`) or a directory of `runway_*` plugins.
//! 2. `runway_*` plugin directories in the working directory.
//!
//! After loading the registry is read-only.

pub mod inline;
pub mod manifest;
pub mod script;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::error::ConfigError;

pub use inline::InlinePlugin;
pub use manifest::{PluginManifest, SymbolCommand, MANIFEST_FILE};
pub use script::ScriptPlugin;

/// Directory name prefix for auto-discovered plugins
pub const PLUGIN_PREFIX: &str = "runway_";

/// A loaded unit of override functions
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Human-readable plugin name
    fn name(&self) -> &str;

    /// Whether this plugin defines `symbol`
    fn has_symbol(&self, symbol: &str) -> bool;

    /// Invoke `symbol` with JSON arguments
    async fn call(&self, symbol: &str, args: Value) -> Result<Value>;
}

/// A symbol bound to the plugin that provides it
#[derive(Clone)]
pub struct PluginFunction {
    plugin: Arc<dyn Plugin>,
    symbol: String,
}

impl PluginFunction {
    pub fn plugin_name(&self) -> &str {
        self.plugin.name()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Call the function and return its raw JSON result
    pub async fn call(&self, args: Value) -> Result<Value> {
        self.plugin.call(&self.symbol, args).await
    }

    /// Call the function and deserialize its result
    pub async fn call_as<T: DeserializeOwned>(&self, args: Value) -> Result<T> {
        let value = self.call(args).await?;

        serde_json::from_value(value).map_err(|e| {
            ConfigError::InvalidPluginOutput {
                plugin: self.plugin_name().to_string(),
                symbol: self.symbol.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for PluginFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginFunction")
            .field("plugin", &self.plugin.name())
            .field("symbol", &self.symbol)
            .finish()
    }
}

/// Ordered collection of loaded plugins
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PluginRegistry {
    /// A registry without plugins (all defaults apply)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from already constructed plugins, in precedence order
    pub fn from_plugins(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    /// Load script plugins from the configured paths, then the working directory.
    ///
    /// Relative paths are resolved against `working_dir`. A configured path
    /// that yields no plugin is a configuration error.
    pub fn load(paths: &[PathBuf], working_dir: &Path) -> Result<Self> {
        let mut plugin_dirs: Vec<PathBuf> = Vec::new();

        for path in paths {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                working_dir.join(path)
            };

            if !path.is_dir() {
                return Err(ConfigError::PluginPath {
                    path,
                    reason: "not a directory".to_string(),
                }
                .into());
            }

            if path.join(MANIFEST_FILE).is_file() {
                plugin_dirs.push(path);
                continue;
            }

            let found = discover(&path)?;
            if found.is_empty() {
                return Err(ConfigError::PluginPath {
                    path,
                    reason: format!(
                        "no {} and no {}* plugin directories inside",
                        MANIFEST_FILE, PLUGIN_PREFIX
                    ),
                }
                .into());
            }
            plugin_dirs.extend(found);
        }

        plugin_dirs.extend(discover(working_dir)?);

        let mut seen = HashSet::new();
        let mut plugins: Vec<Arc<dyn Plugin>> = Vec::new();

        for dir in plugin_dirs {
            let key = dir.canonicalize().unwrap_or_else(|_| dir.clone());
            if !seen.insert(key) {
                debug!(path = %dir.display(), "Plugin already loaded, skipping");
                continue;
            }

            let plugin = ScriptPlugin::load(&dir)?;
            info!(plugin = %plugin.name(), path = %dir.display(), "Loaded plugin");
            plugins.push(Arc::new(plugin));
        }

        Ok(Self { plugins })
    }

    /// Names of loaded plugins, in precedence order
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// First loaded plugin function named `symbol`
    pub fn find_symbol(&self, symbol: &str) -> Option<PluginFunction> {
        self.plugins
            .iter()
            .find(|plugin| plugin.has_symbol(symbol))
            .map(|plugin| PluginFunction {
                plugin: Arc::clone(plugin),
                symbol: symbol.to_string(),
            })
    }

    /// The plugin override for `symbol` wrapped by `adapt`, or `default`
    pub fn default_or_plugin<T>(
        &self,
        symbol: &str,
        default: T,
        adapt: impl FnOnce(PluginFunction) -> T,
    ) -> T {
        match self.find_symbol(symbol) {
            Some(function) => {
                info!(plugin = %function.plugin_name(), symbol, "Using plugin function");
                adapt(function)
            }
            None => {
                debug!(symbol, "Using default function");
                default
            }
        }
    }
}

/// Find `runway_*` plugin directories directly inside `dir`
fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}*/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        PLUGIN_PREFIX,
        MANIFEST_FILE
    );

    let mut found = Vec::new();
    for entry in glob::glob(&pattern)? {
        let manifest = entry?;
        if let Some(plugin_dir) = manifest.parent() {
            found.push(plugin_dir.to_path_buf());
        }
    }

    Ok(found)
}
