//! Container reconciliation.
//!
//! Docker and Podman cannot update a container's image, mounts or environment
//! in place, so a container whose launch configuration drifted from the
//! declared component has to be removed and created again. This module decides
//! when that is necessary.
//!
//! The comparison is one-way: values present in the declaration but missing
//! from the container trigger a recreation, while extra environment entries
//! or mounts on the container are ignored. Detecting removals would require
//! remembering the previously declared state, which nothing here keeps.
//!
//! - [`envvars`]: `KEY=VALUE` encoding and membership
//! - [`mounts`]: declared mount vs. actual mount points

pub mod envvars;
pub mod mounts;

pub use envvars::{contains, encode};

use crate::component::{
    DeclaredComponent, DeclaredMount, RuntimeContainerConfig, RuntimeMountPoint,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why a container must be recreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecreateReason {
    /// Declared image differs from the container's image
    Image { declared: String, actual: String },
    /// A declared volume is not mounted at its declared path
    Mount { source: String, target: String },
    /// A declared `KEY=VALUE` entry is missing from the container environment
    Env { entry: String },
}

impl std::fmt::Display for RecreateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecreateReason::Image { declared, actual } => {
                write!(f, "image changed from {} to {}", actual, declared)
            }
            RecreateReason::Mount { source, target } => {
                write!(f, "volume {} is not mounted at {}", source, target)
            }
            RecreateReason::Env { entry } => write!(f, "environment entry {} is missing", entry),
        }
    }
}

/// Find the first reason the container no longer matches the declaration.
///
/// Checks run in a fixed order: image, then mounts, then environment.
/// Returns `None` when the container is in sync.
pub fn diagnose(
    declared: &DeclaredComponent,
    runtime: &RuntimeContainerConfig,
    declared_mounts: &[DeclaredMount],
    runtime_mounts: &[RuntimeMountPoint],
) -> Option<RecreateReason> {
    if declared.image != runtime.image {
        debug!(
            "Component {}: image {} differs from running {}",
            declared.name, declared.image, runtime.image
        );
        return Some(RecreateReason::Image {
            declared: declared.image.clone(),
            actual: runtime.image.clone(),
        });
    }

    if let Some(missing) = declared_mounts
        .iter()
        .find(|mount| !mounts::matches(mount, runtime_mounts))
    {
        debug!(
            "Component {}: volume {} not mounted at {}",
            declared.name, missing.source, missing.target
        );
        return Some(RecreateReason::Mount {
            source: missing.source.clone(),
            target: missing.target.clone(),
        });
    }

    if let Some(missing) = encode(&declared.env)
        .into_iter()
        .find(|entry| !contains(entry, &runtime.env))
    {
        debug!("Component {}: env entry {} missing", declared.name, missing);
        return Some(RecreateReason::Env { entry: missing });
    }

    None
}

/// Returns true if the running container must be removed and recreated.
pub fn needs_recreation(
    declared: &DeclaredComponent,
    runtime: &RuntimeContainerConfig,
    declared_mounts: &[DeclaredMount],
    runtime_mounts: &[RuntimeMountPoint],
) -> bool {
    diagnose(declared, runtime, declared_mounts, runtime_mounts).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_mount() -> DeclaredMount {
        DeclaredMount::new("odo-project-vol", "/projects")
    }

    fn project_mount_point() -> RuntimeMountPoint {
        RuntimeMountPoint::new("odo-project-vol", "/projects")
    }

    #[test]
    fn test_image_change_requires_recreation() {
        let declared = DeclaredComponent::new("web", "node:12");
        let runtime = RuntimeContainerConfig::new("node:10");

        assert!(needs_recreation(&declared, &runtime, &[], &[]));
    }

    #[test]
    fn test_in_sync_container() {
        let declared = DeclaredComponent::new("web", "node:12");
        let runtime = RuntimeContainerConfig::new("node:12");

        assert!(!needs_recreation(
            &declared,
            &runtime,
            &[project_mount()],
            &[project_mount_point()]
        ));
    }

    #[test]
    fn test_missing_env_requires_recreation() {
        let declared = DeclaredComponent::new("web", "node:12").with_env("FOO", "bar");
        let runtime = RuntimeContainerConfig::new("node:12").with_env("BAZ=qux");

        assert_eq!(
            diagnose(
                &declared,
                &runtime,
                &[project_mount()],
                &[project_mount_point()]
            ),
            Some(RecreateReason::Env {
                entry: "FOO=bar".to_string()
            })
        );
    }

    #[test]
    fn test_changed_env_value_requires_recreation() {
        let declared = DeclaredComponent::new("web", "node:12").with_env("FOO", "new");
        let runtime = RuntimeContainerConfig::new("node:12").with_env("FOO=old");

        assert!(needs_recreation(&declared, &runtime, &[], &[]));
    }

    #[test]
    fn test_extra_runtime_state_is_ignored() {
        let declared = DeclaredComponent::new("web", "node:12").with_env("FOO", "bar");
        let runtime = RuntimeContainerConfig::new("node:12")
            .with_env("PATH=/usr/local/bin")
            .with_env("FOO=bar")
            .with_env("HOSTNAME=abc");
        let runtime_mounts = vec![
            project_mount_point(),
            RuntimeMountPoint::new("leftover", "/leftover"),
        ];

        assert!(!needs_recreation(
            &declared,
            &runtime,
            &[project_mount()],
            &runtime_mounts
        ));
    }

    #[test]
    fn test_mount_at_wrong_path() {
        let declared = DeclaredComponent::new("web", "node:12");
        let runtime = RuntimeContainerConfig::new("node:12");

        let reason = diagnose(
            &declared,
            &runtime,
            &[project_mount()],
            &[RuntimeMountPoint::new("odo-project-vol", "/src")],
        );
        assert_eq!(
            reason,
            Some(RecreateReason::Mount {
                source: "odo-project-vol".to_string(),
                target: "/projects".to_string()
            })
        );
    }

    #[test]
    fn test_image_checked_first() {
        let declared = DeclaredComponent::new("web", "node:12").with_env("FOO", "bar");
        let runtime = RuntimeContainerConfig::new("node:10");

        let reason = diagnose(&declared, &runtime, &[project_mount()], &[]);
        assert!(matches!(reason, Some(RecreateReason::Image { .. })));
    }

    #[test]
    fn test_mounts_checked_before_env() {
        let declared = DeclaredComponent::new("web", "node:12").with_env("FOO", "bar");
        let runtime = RuntimeContainerConfig::new("node:12");

        let reason = diagnose(&declared, &runtime, &[project_mount()], &[]);
        assert!(matches!(reason, Some(RecreateReason::Mount { .. })));
    }

    #[test]
    fn test_image_tags_are_not_normalized() {
        let declared = DeclaredComponent::new("web", "node");
        let runtime = RuntimeContainerConfig::new("node:latest");

        assert!(needs_recreation(&declared, &runtime, &[], &[]));
    }

    #[test]
    fn test_reason_display() {
        let reason = RecreateReason::Image {
            declared: "node:12".to_string(),
            actual: "node:10".to_string(),
        };
        assert_eq!(reason.to_string(), "image changed from node:10 to node:12");
    }
}
