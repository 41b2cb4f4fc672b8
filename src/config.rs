//! Loading of the two deployment documents.
//!
//! A runway root directory (default `.runway/`) holds:
//! - `deployment.yml`: the pipeline, an ordered `steps` list
//! - `config.yml`: global settings (plugins, naming templates, ...)
//!
//! Either file may use the `.yaml` extension instead. Both documents are kept
//! as JSON trees so arbitrary step fields survive merging and can be handed to
//! plugins untouched; typed views cover the keys runway itself reads.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::core::error::ConfigError;
use crate::core::naming::NamingTemplate;
use crate::domain::ConfigMap;

/// Default root directory for the deployment documents
pub const DEFAULT_ROOT: &str = ".runway";

/// Default Azure region for created resources
pub const DEFAULT_LOCATION: &str = "westeurope";

/// The pipeline description (`deployment.yml`)
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Ordered step descriptors, each carrying a `task` key
    pub steps: Vec<ConfigMap>,
}

impl Deployment {
    /// Load the pipeline from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployment file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to load deployment file: {}", path.display()))
    }

    /// Parse the pipeline from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let document = parse_mapping(content).context("Failed to parse deployment YAML")?;

        let steps = document
            .get("steps")
            .and_then(Value::as_array)
            .ok_or_else(|| ConfigError::missing_key("steps"))?;

        let steps = steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                step.as_object()
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("Step {} is not a mapping", i))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { steps })
    }
}

/// Global settings (`config.yml`)
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// The whole document, merged under every step's fields
    raw: ConfigMap,

    view: SettingsView,
}

/// Keys runway reads from the settings document
#[derive(Debug, Clone, Default, Deserialize)]
struct SettingsView {
    #[serde(default)]
    plugins: Vec<PathBuf>,

    #[serde(default)]
    azure: AzureSettings,

    #[serde(default)]
    environment_keys: EnvironmentKeys,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureSettings {
    pub subscription_id: Option<String>,

    #[serde(default = "default_location")]
    pub location: String,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            subscription_id: None,
            location: default_location(),
        }
    }
}

/// Names of CI environment variables that take precedence over git
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentKeys {
    /// Variable holding the source branch (detached HEAD builds)
    pub branch_name: Option<String>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse settings from YAML content and validate naming templates
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw = parse_mapping(content).context("Failed to parse config YAML")?;
        Self::from_map(raw)
    }

    /// Build settings from an already parsed mapping
    pub fn from_map(raw: ConfigMap) -> Result<Self> {
        let view: SettingsView = serde_json::from_value(Value::Object(raw.clone()))
            .context("Invalid config structure")?;

        validate_naming_templates(&raw)?;

        Ok(Self { raw, view })
    }

    /// Configured plugin locations, in precedence order
    pub fn plugins(&self) -> &[PathBuf] {
        &self.view.plugins
    }

    pub fn azure(&self) -> &AzureSettings {
        &self.view.azure
    }

    pub fn environment_keys(&self) -> &EnvironmentKeys {
        &self.view.environment_keys
    }

    pub fn as_map(&self) -> &ConfigMap {
        &self.raw
    }

    /// The whole document as a JSON object (handed to plugins)
    pub fn to_value(&self) -> Value {
        Value::Object(self.raw.clone())
    }
}

/// Both documents from one root directory
#[derive(Debug, Clone)]
pub struct DeployDocuments {
    pub root: PathBuf,
    pub deployment: Deployment,
    pub settings: Settings,
}

/// Load `deployment` and `config` documents from `root`
pub fn load(root: &Path) -> Result<DeployDocuments> {
    let deployment = Deployment::from_file(&document_path(root, "deployment")?)?;
    let settings = Settings::from_file(&document_path(root, "config")?)?;

    Ok(DeployDocuments {
        root: root.to_path_buf(),
        deployment,
        settings,
    })
}

/// Find `<root>/<name>.yml`, falling back to `<root>/<name>.yaml`
pub fn document_path(root: &Path, name: &str) -> Result<PathBuf> {
    let yml = root.join(format!("{}.yml", name));
    if yml.is_file() {
        return Ok(yml);
    }

    let yaml = root.join(format!("{}.yaml", name));
    if yaml.is_file() {
        return Ok(yaml);
    }

    anyhow::bail!(
        "Config document '{}' not found. Looked for:\n  - {}\n  - {}",
        name,
        yml.display(),
        yaml.display()
    )
}

fn parse_mapping(content: &str) -> Result<ConfigMap> {
    let value: Value = serde_yaml::from_str(content)?;

    match value {
        Value::Object(map) => Ok(map),
        // An empty document is an empty mapping
        Value::Null => Ok(ConfigMap::new()),
        _ => anyhow::bail!("Document root must be a mapping"),
    }
}

/// Check every `azure.*_naming` template up front so a bad template fails
/// the run before any step executes.
fn validate_naming_templates(raw: &ConfigMap) -> Result<(), ConfigError> {
    let Some(azure) = raw.get("azure").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in azure.iter().filter(|(k, _)| k.ends_with("_naming")) {
        let full_key = format!("azure.{}", key);
        match value.as_str() {
            Some(template) => {
                NamingTemplate::parse(&full_key, template)?;
            }
            None => {
                return Err(ConfigError::InvalidTemplate {
                    key: full_key,
                    template: value.to_string(),
                    reason: "expected a string".to_string(),
                });
            }
        }
    }

    Ok(())
}
