//! runway - Environment-aware deployment pipeline runner
//!
//! Reads a declarative pipeline and runs idempotent provisioning steps
//! against the environment derived from git.
//!
//! # Architecture
//!
//! - The environment resolver maps git state (tag, branch, hash) to an
//!   `ApplicationVersion`: tag -> PRD, `master` -> ACP, otherwise DEV
//! - Plugins may replace the environment logic and any naming convention
//! - Steps run sequentially and fail fast; each is idempotent, so re-running
//!   the whole pipeline is the recovery path
//!
//! # Modules
//!
//! - `adapters`: External platforms (Azure, Databricks, Key Vault)
//! - `core`: Environment resolution, naming, reconciliation, executor
//! - `domain`: Data structures (ApplicationVersion, Secret, StepConfig)
//! - `plugins`: Plugin registry and script plugins
//! - `steps`: Provisioning steps and the task registry
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run the pipeline in .runway/
//! runway
//!
//! # Use another root directory
//! runway deploy/.runway
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod plugins;
pub mod steps;

// Re-export main types at crate root for convenience
pub use crate::core::{ConfigError, EnvironmentResolver, Executor, GitState, NamingResolver, PipelineRun};
pub use domain::{ApplicationVersion, Environment, Secret, StepConfig};
pub use plugins::{Plugin, PluginRegistry};
pub use steps::{Step, StepContext, StepRegistry};
