//! Core deployment logic.
//!
//! This module contains:
//! - Git/Environment: Mapping source-control state to an ApplicationVersion
//! - Naming: Overridable resource naming conventions
//! - Reconcile: Find-or-create and secret propagation primitives
//! - Executor: Sequential, fail-fast step runner

pub mod environment;
pub mod error;
pub mod executor;
pub mod git;
pub mod naming;
pub mod reconcile;

// Re-export commonly used types
pub use environment::{resolve, EnvironmentLogic, EnvironmentResolver, DEPLOY_ENV_LOGIC};
pub use error::ConfigError;
pub use executor::{Executor, PipelineRun};
pub use git::GitState;
pub use naming::{NameCategory, NamingConvention, NamingResolver, NamingTemplate};
pub use reconcile::{ensure_resource, ensure_scope, propagate_secrets, put_secrets};
