//! Declared and runtime-reported component state.
//!
//! The declared side is what the developer asked for (already parsed into
//! memory); the runtime side is what the container engine reports for a live
//! container. The reconciliation logic in [`crate::reconcile`] compares the two.

use serde::{Deserialize, Serialize};

/// A single declared environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Variable value
    pub value: String,
}

impl EnvVar {
    /// Create a new environment variable pair.
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Desired state of one container of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredComponent {
    /// Identifier used for labeling
    pub name: String,
    /// Exact image reference, compared literally
    pub image: String,
    /// Ordered environment variables
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

impl DeclaredComponent {
    /// Create a declared component with no environment.
    pub fn new<N: Into<String>, I: Into<String>>(name: N, image: I) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            env: Vec::new(),
        }
    }

    /// Append an environment variable.
    pub fn with_env<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.env.push(EnvVar::new(name, value));
        self
    }
}

/// Desired volume attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclaredMount {
    /// Volume name
    pub source: String,
    /// Absolute path inside the container
    pub target: String,
}

impl DeclaredMount {
    pub fn new<S: Into<String>, T: Into<String>>(source: S, target: T) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Launch configuration of a live container as reported by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeContainerConfig {
    /// Image the container was created from
    pub image: String,
    /// Flat `KEY=VALUE` entries in runtime order
    #[serde(default)]
    pub env: Vec<String>,
}

impl RuntimeContainerConfig {
    pub fn new<I: Into<String>>(image: I) -> Self {
        Self {
            image: image.into(),
            env: Vec::new(),
        }
    }

    /// Append a raw `KEY=VALUE` entry.
    pub fn with_env<S: Into<String>>(mut self, entry: S) -> Self {
        self.env.push(entry.into());
        self
    }
}

/// One mount point of a live container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMountPoint {
    /// Volume name
    pub name: String,
    /// Path inside the container
    pub destination: String,
}

impl RuntimeMountPoint {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, destination: D) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
        }
    }
}
