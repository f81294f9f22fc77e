//! Matching of declared volume mounts against a container's mount points.

use crate::component::{DeclaredMount, RuntimeMountPoint};

/// Returns true if the declared volume is mounted at the declared path.
///
/// Both the volume name and the destination must match; a correctly named
/// volume at the wrong path does not count.
pub fn matches(declared: &DeclaredMount, actual: &[RuntimeMountPoint]) -> bool {
    actual
        .iter()
        .any(|mount| mount.name == declared.source && mount.destination == declared.target)
}
