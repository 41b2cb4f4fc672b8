//! Domain types for the runway deployer.
//!
//! This module contains the core data structures:
//! - ApplicationVersion: Resolved environment, version and branch
//! - Secret: Values written into a secret scope
//! - StepConfig: Merged configuration for one pipeline step

pub mod secret;
pub mod step_config;
pub mod version;

// Re-export commonly used types
pub use secret::Secret;
pub use step_config::{ConfigMap, StepConfig};
pub use version::{ApplicationVersion, Environment, SNAPSHOT};
