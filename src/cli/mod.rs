//! Command-line interface for runway.
//!
//! `runway [ROOT]` loads `deployment.yml` and `config.yml` from ROOT
//! (default `.runway`), resolves the application version from git and runs
//! the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::adapters::{AzurePlatform, EnvCredentials};
use crate::config::{self, DEFAULT_ROOT};
use crate::core::{EnvironmentResolver, Executor, GitState, NamingResolver};
use crate::plugins::PluginRegistry;
use crate::steps::StepRegistry;

const BANNER: &str = r"

  _ __ _   _ _ ____      ____ _ _   _
 | '__| | | | '_ \ \ /\ / / _` | | | |
 | |  | |_| | | | \ V  V / (_| | |_| |
 |_|   \__,_|_| |_|\_/\_/ \__,_|\__, |
                                |___/
";

/// runway - Environment-aware deployment pipeline runner
#[derive(Parser, Debug)]
#[command(name = "runway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing deployment.yml and config.yml
    #[arg(default_value = DEFAULT_ROOT)]
    pub root: PathBuf,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
        deploy(&self.root, &working_dir).await
    }
}

/// Load the documents under `root` and run the pipeline
async fn deploy(root: &Path, working_dir: &Path) -> Result<()> {
    info!("{}", BANNER);
    info!(root = %root.display(), "Loading runway configuration");

    let documents = config::load(root)?;
    let settings = &documents.settings;

    // All plugin loading happens here, before any step runs
    if !settings.plugins().is_empty() {
        info!(paths = ?settings.plugins(), "Adding plugins from configured paths and working directory");
    }
    let plugins = PluginRegistry::load(settings.plugins(), working_dir)?;

    let git = GitState::discover(working_dir, settings.environment_keys().branch_name.as_deref()).await?;
    let version = EnvironmentResolver::new(&plugins)
        .resolve(&settings.to_value(), &git)
        .await?;
    info!(%version, "Running runway with application version");

    let executor = Executor::new(
        StepRegistry::builtin(),
        Arc::new(NamingResolver::new(&plugins)),
        Arc::new(AzurePlatform::new(settings, Arc::new(EnvCredentials))),
    );

    let run = executor
        .run(&version, &documents.deployment.steps, settings.as_map())
        .await?;

    eprintln!(
        "\n[Run {} completed successfully: {} task(s) for {}]",
        run.id,
        run.completed.len(),
        run.version
    );

    Ok(())
}
