//! In-process plugins built from closures.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::Plugin;
use crate::core::error::ConfigError;

type InlineFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Plugin whose symbols are Rust closures.
///
/// Useful when embedding runway as a library: an organization can register
/// its naming conventions without shipping scripts.
#[derive(Clone)]
pub struct InlinePlugin {
    name: String,
    symbols: HashMap<String, InlineFn>,
}

impl InlinePlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: HashMap::new(),
        }
    }

    /// Define `symbol`
    pub fn with_symbol<F>(mut self, symbol: impl Into<String>, function: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.symbols.insert(symbol.into(), Arc::new(function));
        self
    }
}

#[async_trait]
impl Plugin for InlinePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    async fn call(&self, symbol: &str, args: Value) -> Result<Value> {
        let function = self.symbols.get(symbol).ok_or_else(|| ConfigError::MissingSymbol {
            plugin: self.name.clone(),
            symbol: symbol.to_string(),
        })?;

        function(args)
    }
}
