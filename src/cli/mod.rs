//! CLI-specific functionality
//!
//! This module contains argument parsing and the environment file commands.
//! Push and check are driven from the binary since they need a live runtime.

pub mod args;
pub mod env;

pub use args::{Args, ComponentConfig, EnvSetConfig, ExecutionMode};
