//! Label-based lookup of component containers and volumes.
//!
//! Managed containers and volumes carry a `component=<name>` label; project
//! volumes additionally carry `type=projects`. A [`LabelSelector`] requires
//! every one of its labels to be present with the exact value.

use crate::env::labels;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Name of a component, used as the lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentName(String);

impl ComponentName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ComponentName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Anything the runtime reports with a label map.
pub trait Labelled {
    fn labels(&self) -> &HashMap<String, String>;
}

/// A set of labels that must all match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    required: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key=value`.
    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.required.insert(key.into(), value.into());
        self
    }

    /// Selects the containers of a component.
    pub fn component(name: &ComponentName) -> Self {
        Self::new().with(labels::COMPONENT, name.as_str())
    }

    /// Selects the project-source volume of a component.
    pub fn project_volume(name: &ComponentName) -> Self {
        Self::component(name).with(labels::TYPE, labels::PROJECTS_TYPE)
    }

    /// Returns true if every required label is present with the same value.
    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        self.required
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    /// Required labels in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.required.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Labels rendered as runtime `label=` filters (`key=value`).
    pub fn to_filters(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
    }
}

/// Container entry from a runtime listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    pub id: String,
    /// Runtime state as reported by the engine (e.g. `running`, `exited`)
    pub state: String,
    pub labels: HashMap<String, String>,
}

impl ContainerDescriptor {
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

impl Labelled for ContainerDescriptor {
    fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }
}

/// Volume entry from a runtime listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    pub name: String,
    pub driver: String,
    pub labels: HashMap<String, String>,
}

impl Labelled for VolumeDescriptor {
    fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }
}

/// Keep only the items whose labels satisfy `selector`.
pub fn filter_by_label<T: Labelled + Clone>(items: &[T], selector: &LabelSelector) -> Vec<T> {
    items
        .iter()
        .filter(|item| selector.matches(item.labels()))
        .cloned()
        .collect()
}

/// Containers belonging to the component.
pub fn containers_for_component(
    name: &ComponentName,
    containers: &[ContainerDescriptor],
) -> Vec<ContainerDescriptor> {
    filter_by_label(containers, &LabelSelector::component(name))
}

/// Containers of the component from a runtime listing.
///
/// A failed listing yields no containers, so that callers go on to create the
/// component rather than skip its setup.
pub fn containers_or_absent<E: fmt::Display>(
    name: &ComponentName,
    listing: std::result::Result<Vec<ContainerDescriptor>, E>,
) -> Vec<ContainerDescriptor> {
    match listing {
        Ok(containers) => {
            let found = containers_for_component(name, &containers);
            debug!("Found {} container(s) for component {}", found.len(), name);
            found
        }
        Err(e) => {
            warn!(
                "Unable to list containers, treating component {} as absent: {}",
                name, e
            );
            Vec::new()
        }
    }
}

/// Returns true if at least one container of the component exists.
///
/// A failed listing counts as "absent".
pub fn component_exists<E: fmt::Display>(
    name: &ComponentName,
    listing: std::result::Result<Vec<ContainerDescriptor>, E>,
) -> bool {
    !containers_or_absent(name, listing).is_empty()
}
