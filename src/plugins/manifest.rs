//! Script plugin manifest (`plugin.yaml`).
//!
//! ```yaml
//! name: acme
//! symbols:
//!   get_resource_group_name:
//!     command: ./naming.sh
//!     args: [resource-group]
//!   deploy_env_logic:
//!     command: python3
//!     args: [env_logic.py]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::core::error::ConfigError;

/// Manifest file name inside a plugin directory
pub const MANIFEST_FILE: &str = "plugin.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    /// Plugin name (used in logs and errors)
    pub name: String,

    /// Symbol name -> command implementing it
    #[serde(default)]
    pub symbols: HashMap<String, SymbolCommand>,
}

/// Command run when a symbol is called
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolCommand {
    /// Program to run; `./` and `../` paths are relative to the plugin directory
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

impl PluginManifest {
    /// Read and validate `<plugin_dir>/plugin.yaml`
    pub fn from_dir(plugin_dir: &Path) -> Result<Self, ConfigError> {
        let path = plugin_dir.join(MANIFEST_FILE);
        let invalid = |reason: String| ConfigError::InvalidManifest {
            path: path.clone(),
            reason,
        };

        let content = std::fs::read_to_string(&path).map_err(|e| invalid(e.to_string()))?;
        let manifest: Self = serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        if manifest.name.trim().is_empty() {
            return Err(invalid("plugin name cannot be empty".to_string()));
        }

        if let Some((symbol, _)) = manifest
            .symbols
            .iter()
            .find(|(_, cmd)| cmd.command.trim().is_empty())
        {
            return Err(invalid(format!("symbol '{}' has an empty command", symbol)));
        }

        Ok(manifest)
    }
}
