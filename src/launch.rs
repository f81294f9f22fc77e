//! Launch configuration for component containers.
//!
//! [`HostLaunchConfig`] carries the volume mounts of a container about to be
//! created, and [`ContainerSpec`] wraps it together with the image,
//! environment and labels. Both are plain owned values: the
//! caller builds one per container and hands it to the runtime.

use crate::env::PROJECT_SOURCE_MOUNT;
use crate::runtime::{ContainerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named volume mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    /// Volume name
    pub source: String,
    /// Path inside the container
    pub target: String,
}

impl MountSpec {
    pub fn volume<S: Into<String>, T: Into<String>>(source: S, target: T) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Host-side launch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLaunchConfig {
    /// Mounts in attachment order
    pub mounts: Vec<MountSpec>,
}

impl HostLaunchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mount.
    pub fn mount(mut self, mount: MountSpec) -> Self {
        self.mounts.push(mount);
        self
    }

    /// Append the project-source volume mount through a scoped borrow.
    ///
    /// Not idempotent: every call appends another mount.
    pub fn attach_project_volume(&mut self, volume_name: &str) -> &mut Self {
        self.mounts
            .push(MountSpec::volume(volume_name, PROJECT_SOURCE_MOUNT));
        self
    }
}

/// Append the project-source volume to `config` and hand it back.
///
/// The volume is mounted at [`PROJECT_SOURCE_MOUNT`]. Calling this twice with
/// the same name yields two identical mounts, so callers attach at most once
/// per container creation.
pub fn attach_project_volume(volume_name: &str, mut config: HostLaunchConfig) -> HostLaunchConfig {
    config.attach_project_volume(volume_name);
    config
}

/// Everything needed to create one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container name (runtime generated if None)
    pub name: Option<String>,
    pub image: String,
    /// Flat `KEY=VALUE` entries
    pub env: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub cmd: Option<Vec<String>>,
    pub working_dir: Option<String>,
    pub host: HostLaunchConfig,
}

impl ContainerSpec {
    /// Create a new specification builder.
    pub fn builder() -> ContainerSpecBuilder {
        ContainerSpecBuilder::default()
    }
}

/// Fluent builder for [`ContainerSpec`].
#[derive(Debug, Default)]
pub struct ContainerSpecBuilder {
    name: Option<String>,
    image: Option<String>,
    env: Vec<String>,
    labels: BTreeMap<String, String>,
    cmd: Option<Vec<String>>,
    working_dir: Option<String>,
    host: HostLaunchConfig,
}

impl ContainerSpecBuilder {
    /// Set the container name.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the container image.
    pub fn image<S: Into<String>>(mut self, image: S) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Add pre-encoded `KEY=VALUE` entries.
    pub fn env_entries<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Add a label to the container.
    pub fn label<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Set the command to run in the container.
    pub fn cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = Some(cmd.into_iter().map(Into::into).collect());
        self
    }

    /// Set the working directory in the container.
    pub fn working_dir<S: Into<String>>(mut self, dir: S) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Use the given host launch configuration.
    pub fn host(mut self, host: HostLaunchConfig) -> Self {
        self.host = host;
        self
    }

    /// Build the specification.
    ///
    /// # Errors
    ///
    /// Returns error if the image is missing or empty.
    pub fn build(self) -> Result<ContainerSpec> {
        let image = self
            .image
            .filter(|image| !image.is_empty())
            .ok_or_else(|| ContainerError::ConfigError("Image is required".to_string()))?;

        Ok(ContainerSpec {
            name: self.name,
            image,
            env: self.env,
            labels: self.labels,
            cmd: self.cmd,
            working_dir: self.working_dir,
            host: self.host,
        })
    }
}
