//! Resource naming conventions.
//!
//! Every resource category has one naming function. A plugin symbol named
//! after the category (e.g. `get_resource_group_name`) replaces the default
//! convention entirely; otherwise a template containing `{env}` is rendered
//! with the version's formatted environment.
//!
//! Most templates live under the `azure` section of the settings document.
//! Event hub entities and databricks secrets are declared per step, so their
//! template is passed in directly.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::error::ConfigError;
use crate::domain::ApplicationVersion;
use crate::plugins::{PluginFunction, PluginRegistry};

/// The only placeholder a naming template may contain
pub const ENV_PLACEHOLDER: &str = "env";

/// A validated naming template.
///
/// Templates from the settings document must contain `{env}`; names declared
/// per step (secret names, event hub entities) may be fixed strings. `{{` and
/// `}}` stand for literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    template: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Env,
}

impl NamingTemplate {
    /// Validate a template that must contain `{env}`; `key` names where it
    /// came from for error messages
    pub fn parse(key: &str, template: &str) -> Result<Self, ConfigError> {
        Self::validate(key, template, true)
    }

    /// Validate a per-step template, which may omit `{env}`
    pub fn parse_step(key: &str, template: &str) -> Result<Self, ConfigError> {
        Self::validate(key, template, false)
    }

    fn validate(key: &str, template: &str, require_env: bool) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidTemplate {
            key: key.to_string(),
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched '}'".to_string())),
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => placeholder.push(c),
                            None => return Err(invalid("unclosed '{'".to_string())),
                        }
                    }

                    if placeholder != ENV_PLACEHOLDER {
                        return Err(invalid(format!("unknown placeholder '{{{}}}'", placeholder)));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Env);
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if require_env && !segments.contains(&Segment::Env) {
            return Err(invalid("missing '{env}' placeholder".to_string()));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// Substitute `{env}` with the version's formatted environment
    pub fn render(&self, version: &ApplicationVersion) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Env => version.environment_formatted(),
            })
            .collect()
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

/// Resource categories with an overridable naming convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameCategory {
    ResourceGroup,
    KeyVault,
    Cosmos,
    EventHubNamespace,
    EventHubEntity,
    DatabricksSecret,
    Kubernetes,
}

impl NameCategory {
    pub const ALL: [NameCategory; 7] = [
        Self::ResourceGroup,
        Self::KeyVault,
        Self::Cosmos,
        Self::EventHubNamespace,
        Self::EventHubEntity,
        Self::DatabricksSecret,
        Self::Kubernetes,
    ];

    /// Plugin symbol overriding this category
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "get_resource_group_name",
            Self::KeyVault => "get_keyvault_name",
            Self::Cosmos => "get_cosmos_name",
            Self::EventHubNamespace => "get_eventhub_name",
            Self::EventHubEntity => "get_eventhub_entity_name",
            Self::DatabricksSecret => "get_databricks_secret_name",
            Self::Kubernetes => "get_kubernetes_name",
        }
    }

    /// Key under `azure` holding the default template; `None` when the
    /// template is supplied per call
    pub fn config_key(&self) -> Option<&'static str> {
        match self {
            Self::ResourceGroup => Some("resource_group_naming"),
            Self::KeyVault => Some("keyvault_naming"),
            Self::Cosmos => Some("cosmos_naming"),
            Self::EventHubNamespace => Some("eventhub_naming"),
            Self::Kubernetes => Some("kubernetes_naming"),
            Self::EventHubEntity | Self::DatabricksSecret => None,
        }
    }
}

/// What a naming convention is computed from
#[derive(Debug, Clone, Copy)]
pub enum NamingInput<'a> {
    /// The settings (or merged step) configuration
    Config(&'a Value),

    /// A template declared by the step itself
    Template(&'a str),
}

/// One naming convention (default template or plugin adapter)
#[async_trait]
pub trait NamingConvention: Send + Sync {
    async fn name(&self, input: NamingInput<'_>, version: &ApplicationVersion) -> Result<String>;
}

/// Default convention for config-backed categories: `azure.<key>` template
#[derive(Debug, Clone)]
pub struct ConfigTemplateNaming {
    key: &'static str,
}

#[async_trait]
impl NamingConvention for ConfigTemplateNaming {
    async fn name(&self, input: NamingInput<'_>, version: &ApplicationVersion) -> Result<String> {
        let full_key = format!("azure.{}", self.key);

        let NamingInput::Config(config) = input else {
            anyhow::bail!("Naming for '{}' expects the config, got a template", full_key);
        };

        let template = config
            .get("azure")
            .and_then(|azure| azure.get(self.key))
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::missing_key(&full_key))?;

        Ok(NamingTemplate::parse(&full_key, template)?.render(version))
    }
}

/// Default convention for per-step templates
#[derive(Debug, Clone)]
pub struct ParameterTemplateNaming {
    category: NameCategory,
}

#[async_trait]
impl NamingConvention for ParameterTemplateNaming {
    async fn name(&self, input: NamingInput<'_>, version: &ApplicationVersion) -> Result<String> {
        let NamingInput::Template(template) = input else {
            anyhow::bail!(
                "Naming for '{}' expects a template, got the config",
                self.category.symbol()
            );
        };

        Ok(NamingTemplate::parse_step(self.category.symbol(), template)?.render(version))
    }
}

/// Adapter calling a plugin symbol with `(config|naming, version)`
#[derive(Debug, Clone)]
pub struct PluginNaming {
    function: PluginFunction,
}

#[async_trait]
impl NamingConvention for PluginNaming {
    async fn name(&self, input: NamingInput<'_>, version: &ApplicationVersion) -> Result<String> {
        let args = match input {
            NamingInput::Config(config) => json!({ "config": config, "version": version }),
            NamingInput::Template(naming) => json!({ "naming": naming, "version": version }),
        };

        self.function.call_as::<String>(args).await
    }
}

/// Naming conventions resolved once against the plugin registry
#[derive(Clone)]
pub struct NamingResolver {
    conventions: HashMap<NameCategory, Arc<dyn NamingConvention>>,
    overridden: HashSet<NameCategory>,
}

impl NamingResolver {
    /// Pick the plugin override or default convention for every category
    pub fn new(registry: &PluginRegistry) -> Self {
        let conventions = NameCategory::ALL
            .iter()
            .map(|&category| {
                let default: Arc<dyn NamingConvention> = match category.config_key() {
                    Some(key) => Arc::new(ConfigTemplateNaming { key }),
                    None => Arc::new(ParameterTemplateNaming { category }),
                };

                let convention = registry.default_or_plugin(category.symbol(), default, |function| {
                    Arc::new(PluginNaming { function }) as Arc<dyn NamingConvention>
                });

                (category, convention)
            })
            .collect();

        let overridden = NameCategory::ALL
            .iter()
            .copied()
            .filter(|category| registry.find_symbol(category.symbol()).is_some())
            .collect();

        Self {
            conventions,
            overridden,
        }
    }

    /// Whether a plugin replaces the default convention for `category`
    pub fn is_overridden(&self, category: NameCategory) -> bool {
        self.overridden.contains(&category)
    }

    /// Check a per-step template up front, unless a plugin will receive it
    /// verbatim
    pub fn check_template(&self, category: NameCategory, key: &str, template: &str) -> Result<(), ConfigError> {
        if !self.is_overridden(category) {
            NamingTemplate::parse_step(key, template)?;
        }
        Ok(())
    }

    /// Name for a config-backed category
    pub async fn resolve_name(
        &self,
        category: NameCategory,
        config: &Value,
        version: &ApplicationVersion,
    ) -> Result<String> {
        self.convention(category)?
            .name(NamingInput::Config(config), version)
            .await
    }

    /// Name for a category whose template is declared per step
    pub async fn resolve_template(
        &self,
        category: NameCategory,
        template: &str,
        version: &ApplicationVersion,
    ) -> Result<String> {
        self.convention(category)?
            .name(NamingInput::Template(template), version)
            .await
    }

    fn convention(&self, category: NameCategory) -> Result<&Arc<dyn NamingConvention>> {
        self.conventions
            .get(&category)
            .ok_or_else(|| anyhow::anyhow!("No naming convention for {:?}", category))
    }

    pub async fn resource_group_name(&self, config: &Value, version: &ApplicationVersion) -> Result<String> {
        self.resolve_name(NameCategory::ResourceGroup, config, version).await
    }

    pub async fn keyvault_name(&self, config: &Value, version: &ApplicationVersion) -> Result<String> {
        self.resolve_name(NameCategory::KeyVault, config, version).await
    }

    pub async fn cosmos_name(&self, config: &Value, version: &ApplicationVersion) -> Result<String> {
        self.resolve_name(NameCategory::Cosmos, config, version).await
    }

    pub async fn eventhub_name(&self, config: &Value, version: &ApplicationVersion) -> Result<String> {
        self.resolve_name(NameCategory::EventHubNamespace, config, version).await
    }

    pub async fn kubernetes_name(&self, config: &Value, version: &ApplicationVersion) -> Result<String> {
        self.resolve_name(NameCategory::Kubernetes, config, version).await
    }

    pub async fn eventhub_entity_name(&self, naming: &str, version: &ApplicationVersion) -> Result<String> {
        self.resolve_template(NameCategory::EventHubEntity, naming, version).await
    }

    pub async fn databricks_secret_name(&self, naming: &str, version: &ApplicationVersion) -> Result<String> {
        self.resolve_template(NameCategory::DatabricksSecret, naming, version).await
    }
}
