//! Script plugins: symbols implemented by external commands.
//!
//! Each call spawns the symbol's command in the plugin directory, writes the
//! JSON arguments to stdin and parses stdout as the JSON result.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::manifest::PluginManifest;
use super::Plugin;
use crate::core::error::ConfigError;

/// A plugin directory with a `plugin.yaml` manifest
#[derive(Debug, Clone)]
pub struct ScriptPlugin {
    dir: PathBuf,
    manifest: PluginManifest,
}

impl ScriptPlugin {
    /// Load the plugin in `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest = PluginManifest::from_dir(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve plugin-relative programs against the plugin directory
    fn program(&self, command: &str) -> PathBuf {
        if command.starts_with("./") || command.starts_with("../") {
            self.dir.join(command)
        } else {
            PathBuf::from(command)
        }
    }
}

#[async_trait]
impl Plugin for ScriptPlugin {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        self.manifest.symbols.contains_key(symbol)
    }

    async fn call(&self, symbol: &str, args: Value) -> Result<Value> {
        let command = self
            .manifest
            .symbols
            .get(symbol)
            .ok_or_else(|| ConfigError::MissingSymbol {
                plugin: self.name().to_string(),
                symbol: symbol.to_string(),
            })?;

        debug!(plugin = %self.name(), symbol, command = %command.command, "Calling plugin");

        let mut child = Command::new(self.program(&command.command))
            .args(&command.args)
            .current_dir(&self.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to spawn plugin '{}' for symbol '{}'",
                    self.name(),
                    symbol
                )
            })?;

        let input = serde_json::to_vec(&args).context("Failed to encode plugin arguments")?;

        // Feed stdin while collecting output; a plugin may exit without
        // reading its arguments, which only shows up as a broken pipe here
        let stdin = child.stdin.take();
        let write_args = async move {
            let Some(mut stdin) = stdin else {
                return Ok::<(), io::Error>(());
            };
            match stdin.write_all(&input).await {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                result => result,
            }
        };

        let (written, output) = tokio::join!(write_args, child.wait_with_output());
        let output = output.with_context(|| format!("Failed to wait for plugin '{}'", self.name()))?;

        if let Err(e) = written {
            debug!(plugin = %self.name(), symbol, error = %e, "Failed to write plugin arguments");
            if output.status.success() {
                return Err(e).with_context(|| format!("Failed to write to plugin '{}' stdin", self.name()));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Plugin '{}' symbol '{}' failed with exit code {}: {}",
                self.name(),
                symbol,
                exit_code,
                stderr.trim()
            );
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            ConfigError::InvalidPluginOutput {
                plugin: self.name().to_string(),
                symbol: symbol.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}
