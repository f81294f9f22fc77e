//! Container runtime integration.
//!
//! The reconciliation logic never talks to the container engine directly; it
//! works on values that a [`ContainerRuntime`] produces. [`DockerRuntime`]
//! implements the trait on top of the bollard Docker/Podman API.
//!
//! - [`docker`]: bollard-backed runtime (feature `containers`)

#[cfg(feature = "containers")]
mod docker;

#[cfg(feature = "containers")]
pub use docker::DockerRuntime;

use crate::component::{RuntimeContainerConfig, RuntimeMountPoint};
use crate::launch::ContainerSpec;
use crate::lookup::{ContainerDescriptor, LabelSelector, VolumeDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Container runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Docker/Podman API error
    #[cfg(feature = "containers")]
    #[error("Container API error: {0}")]
    ApiError(#[from] bollard::errors::Error),

    /// Container not found
    #[error("Container not found: {0}")]
    NotFound(String),

    /// Container configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Volume error
    #[error("Volume error: {0}")]
    VolumeError(String),

    /// General error
    #[error("Container error: {0}")]
    Other(String),
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Runtime connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Connection timeout in seconds
    pub timeout: u64,
    /// Explicit daemon socket (e.g. `unix:///run/podman/podman.sock`)
    pub socket: Option<String>,
    /// Pull images that are missing locally before creating containers
    pub auto_pull: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timeout: 120,
            socket: None,
            auto_pull: true,
        }
    }
}

/// State of a live container as needed for reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSnapshot {
    pub id: String,
    pub config: RuntimeContainerConfig,
    pub mounts: Vec<RuntimeMountPoint>,
}

/// Operations the push orchestration needs from a container engine.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List all containers, including stopped ones.
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>>;

    /// Inspect a container's launch configuration and mounts.
    async fn inspect_container(&self, id: &str) -> Result<ContainerSnapshot>;

    /// Create and start a container, returning its ID.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

    /// Start an existing, stopped container.
    async fn start_container(&self, id: &str) -> Result<()>;

    /// Forcefully remove a container.
    async fn remove_container(&self, id: &str) -> Result<()>;

    /// List volumes carrying every label in `selector`.
    async fn list_volumes(&self, selector: &LabelSelector) -> Result<Vec<VolumeDescriptor>>;

    /// Create a named volume with the given labels.
    async fn create_volume(&self, name: &str, labels: &HashMap<String, String>) -> Result<String>;
}
