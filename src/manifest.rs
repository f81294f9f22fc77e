//! Component manifest loading.
//!
//! A manifest is the in-memory form of a component definition stored as TOML:
//! the component name plus one entry per container with its image,
//! environment and volume mounts.

use crate::component::{DeclaredComponent, DeclaredMount, EnvVar};
use crate::lookup::ComponentName;
use crate::runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Manifest loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid manifest: {0}")]
    Invalid(String),
}

/// One container of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    /// Name of the container within the component
    pub alias: String,
    pub image: String,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub mounts: Vec<DeclaredMount>,
    /// Command overriding the image default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

impl ContainerDefinition {
    /// Declared state of this container, labeled with the component name.
    pub fn declared(&self, component: &ComponentName) -> DeclaredComponent {
        DeclaredComponent {
            name: component.to_string(),
            image: self.image.clone(),
            env: self.env.clone(),
        }
    }
}

/// A component and its containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentManifest {
    pub name: ComponentName,
    #[serde(default)]
    pub containers: Vec<ContainerDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeConfig>,
}

impl ComponentManifest {
    /// Load and validate a manifest from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        debug!("Loading manifest from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a manifest from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        let manifest: ComponentManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the invariants the reconciliation relies on.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.as_str().is_empty() {
            return Err(ManifestError::Invalid(
                "component name must not be empty".to_string(),
            ));
        }

        let mut aliases = HashSet::new();
        for container in &self.containers {
            if container.alias.is_empty() {
                return Err(ManifestError::Invalid(format!(
                    "container of component {} has an empty alias",
                    self.name
                )));
            }
            if !aliases.insert(container.alias.as_str()) {
                return Err(ManifestError::Invalid(format!(
                    "duplicate container alias: {}",
                    container.alias
                )));
            }
            if container.image.is_empty() {
                return Err(ManifestError::Invalid(format!(
                    "container {} has no image",
                    container.alias
                )));
            }
            if let Some(mount) = container.mounts.iter().find(|m| !m.target.starts_with('/')) {
                return Err(ManifestError::Invalid(format!(
                    "mount target {} of container {} is not absolute",
                    mount.target, container.alias
                )));
            }
        }

        Ok(())
    }

    /// Runtime settings, falling back to defaults.
    pub fn runtime_config(&self) -> RuntimeConfig {
        self.runtime.clone().unwrap_or_default()
    }
}
