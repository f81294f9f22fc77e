//! # devsync
//!
//! Keeps the containers of a devfile component in sync with their declared
//! configuration on a local Docker or Podman runtime.
//!
//! Containers cannot be updated in place, so every push compares each running
//! container with its declaration and recreates only the ones that drifted.
//!
//! ## Architecture Overview
//!
//! - **[`reconcile`]**: the comparator deciding whether a container must be recreated
//! - **[`launch`]**: launch configuration and project-source volume attachment
//! - **[`lookup`]**: label-based lookup of component containers and volumes
//! - **[`runtime`]**: container runtime trait and its bollard implementation
//! - **[`adapter`]**: push orchestration across a component's containers
//! - **[`manifest`]**, **[`envinfo`]**: on-disk component manifest and environment file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use devsync::component::{
//!     DeclaredComponent, DeclaredMount, RuntimeContainerConfig, RuntimeMountPoint,
//! };
//! use devsync::reconcile::needs_recreation;
//!
//! let declared = DeclaredComponent::new("web", "node:12").with_env("FOO", "bar");
//! let running = RuntimeContainerConfig::new("node:12").with_env("FOO=bar");
//!
//! let recreate = needs_recreation(
//!     &declared,
//!     &running,
//!     &[DeclaredMount::new("web-vol", "/projects")],
//!     &[RuntimeMountPoint::new("web-vol", "/projects")],
//! );
//! assert!(!recreate);
//! ```

/// Declared and runtime-reported component state.
pub mod component;

/// Container reconciliation comparator.
pub mod reconcile;

/// Launch configuration and project volume attachment.
pub mod launch;

/// Label-based component lookup.
pub mod lookup;

/// Container runtime integration.
pub mod runtime;

/// Push orchestration.
pub mod adapter;

/// Component manifest loading.
pub mod manifest;

/// Per-context environment file.
pub mod envinfo;

/// Environment constants and path utilities.
pub mod env;

// CLI module for command-line interface
pub mod cli;

pub use adapter::{ComponentAdapter, ContainerStatus, PushAction, PushReport};
pub use component::{
    DeclaredComponent, DeclaredMount, EnvVar, RuntimeContainerConfig, RuntimeMountPoint,
};
pub use launch::{HostLaunchConfig, attach_project_volume};
pub use lookup::{ComponentName, LabelSelector, component_exists, filter_by_label};
pub use manifest::ComponentManifest;
pub use reconcile::{RecreateReason, diagnose, encode, needs_recreation};
pub use runtime::{ContainerError, ContainerRuntime};
