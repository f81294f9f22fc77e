//! Push orchestration for a component.
//!
//! Brings the containers of one component in line with its manifest: makes
//! sure the project-source volume exists, creates missing containers and
//! recreates the ones whose launch configuration drifted. Containers that
//! still match are left alone, or started again if they had stopped.

use crate::component::DeclaredMount;
use crate::env::{PROJECT_SOURCE_MOUNT, labels};
use crate::launch::{ContainerSpec, HostLaunchConfig, MountSpec, attach_project_volume};
use crate::lookup::{
    ComponentName, ContainerDescriptor, LabelSelector, component_exists, containers_or_absent,
    filter_by_label,
};
use crate::manifest::{ComponentManifest, ContainerDefinition};
use crate::reconcile::{self, RecreateReason};
use crate::runtime::{ContainerRuntime, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// What a push did to one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PushAction {
    Created { id: String },
    Recreated { id: String, reason: RecreateReason },
    /// Configuration matched but the container was not running
    Started { id: String },
    Unchanged { id: String },
}

/// Result of a push for a whole component.
#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    pub component: ComponentName,
    pub project_volume: String,
    /// Per-container actions keyed by alias, in manifest order
    pub actions: Vec<(String, PushAction)>,
}

/// Reconciliation state of one container, computed without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContainerStatus {
    Missing,
    InSync { id: String },
    /// Configuration matches but the container is not running
    Stopped { id: String },
    Stale { id: String, reason: RecreateReason },
}

/// Drives a component's containers through a runtime.
pub struct ComponentAdapter<R: ContainerRuntime> {
    runtime: R,
    manifest: ComponentManifest,
}

impl<R: ContainerRuntime> ComponentAdapter<R> {
    pub fn new(runtime: R, manifest: ComponentManifest) -> Self {
        Self { runtime, manifest }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn component(&self) -> &ComponentName {
        &self.manifest.name
    }

    /// Whether any container of the component exists.
    ///
    /// A failed listing reports the component as absent.
    pub async fn exists(&self) -> bool {
        component_exists(&self.manifest.name, self.runtime.list_containers().await)
    }

    /// Name of the existing project volume, if any.
    ///
    /// # Errors
    ///
    /// Returns error if volumes cannot be listed.
    pub async fn find_project_volume(&self) -> Result<Option<String>> {
        let selector = LabelSelector::project_volume(&self.manifest.name);
        let volumes = self.runtime.list_volumes(&selector).await?;
        Ok(filter_by_label(&volumes, &selector)
            .into_iter()
            .next()
            .map(|v| v.name))
    }

    /// Return the project volume, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns error if volumes cannot be listed or created.
    pub async fn ensure_project_volume(&self) -> Result<String> {
        if let Some(name) = self.find_project_volume().await? {
            debug!("Reusing project volume {}", name);
            return Ok(name);
        }

        let name = project_volume_name(&self.manifest.name);
        let volume_labels: HashMap<String, String> =
            LabelSelector::project_volume(&self.manifest.name)
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

        info!("Creating project volume {} for {}", name, self.manifest.name);
        self.runtime.create_volume(&name, &volume_labels).await
    }

    /// Report each container's state without changing anything.
    ///
    /// # Errors
    ///
    /// Returns error if volumes cannot be listed or a container cannot be
    /// inspected.
    pub async fn check(&self) -> Result<Vec<(String, ContainerStatus)>> {
        let volume = self.find_project_volume().await?;
        let existing = self.existing_containers().await;

        let mut statuses = Vec::with_capacity(self.manifest.containers.len());
        for definition in &self.manifest.containers {
            let status = match find_by_alias(&existing, &definition.alias) {
                None => ContainerStatus::Missing,
                Some(container) => {
                    let id = container.id.clone();
                    match self.diagnose(definition, &id, volume.as_deref()).await? {
                        Some(reason) => ContainerStatus::Stale { id, reason },
                        None if !container.is_running() => ContainerStatus::Stopped { id },
                        None => ContainerStatus::InSync { id },
                    }
                }
            };
            statuses.push((definition.alias.clone(), status));
        }

        Ok(statuses)
    }

    /// Run one reconciliation pass over all containers of the component.
    ///
    /// # Errors
    ///
    /// Returns error if any runtime operation fails; containers handled
    /// before the failure keep their new state.
    pub async fn push(&self) -> Result<PushReport> {
        info!("Pushing component {}", self.manifest.name);

        let volume = self.ensure_project_volume().await?;
        let existing = self.existing_containers().await;

        let mut actions = Vec::with_capacity(self.manifest.containers.len());
        for definition in &self.manifest.containers {
            let action = match find_by_alias(&existing, &definition.alias) {
                None => {
                    let id = self.create(definition, &volume).await?;
                    PushAction::Created { id }
                }
                Some(container) => {
                    match self.diagnose(definition, &container.id, Some(&volume)).await? {
                        Some(reason) => {
                            info!(
                                "Recreating {} of {}: {}",
                                definition.alias, self.manifest.name, reason
                            );
                            self.runtime.remove_container(&container.id).await?;
                            let id = self.create(definition, &volume).await?;
                            PushAction::Recreated { id, reason }
                        }
                        None if !container.is_running() => {
                            info!(
                                "Starting {} of {} (state: {})",
                                definition.alias, self.manifest.name, container.state
                            );
                            self.runtime.start_container(&container.id).await?;
                            PushAction::Started {
                                id: container.id.clone(),
                            }
                        }
                        None => {
                            debug!("{} of {} is up to date", definition.alias, self.manifest.name);
                            PushAction::Unchanged {
                                id: container.id.clone(),
                            }
                        }
                    }
                }
            };
            actions.push((definition.alias.clone(), action));
        }

        Ok(PushReport {
            component: self.manifest.name.clone(),
            project_volume: volume,
            actions,
        })
    }

    async fn existing_containers(&self) -> Vec<ContainerDescriptor> {
        containers_or_absent(&self.manifest.name, self.runtime.list_containers().await)
    }

    async fn diagnose(
        &self,
        definition: &ContainerDefinition,
        id: &str,
        project_volume: Option<&str>,
    ) -> Result<Option<RecreateReason>> {
        let snapshot = self.runtime.inspect_container(id).await?;
        let declared = definition.declared(&self.manifest.name);
        let mounts = declared_mounts(definition, project_volume);

        Ok(reconcile::diagnose(
            &declared,
            &snapshot.config,
            &mounts,
            &snapshot.mounts,
        ))
    }

    async fn create(
        &self,
        definition: &ContainerDefinition,
        project_volume: &str,
    ) -> Result<String> {
        let spec = container_spec(&self.manifest.name, definition, project_volume)?;
        self.runtime.create_container(&spec).await
    }
}

/// Declared mounts of a container, including the project volume when known.
fn declared_mounts(
    definition: &ContainerDefinition,
    project_volume: Option<&str>,
) -> Vec<DeclaredMount> {
    let mut mounts = definition.mounts.clone();
    if let Some(volume) = project_volume {
        mounts.push(DeclaredMount::new(volume, PROJECT_SOURCE_MOUNT));
    }
    mounts
}

/// Creation spec for one container of a component.
pub fn container_spec(
    component: &ComponentName,
    definition: &ContainerDefinition,
    project_volume: &str,
) -> Result<ContainerSpec> {
    let host = definition
        .mounts
        .iter()
        .fold(HostLaunchConfig::new(), |host, mount| {
            host.mount(MountSpec::volume(&mount.source, &mount.target))
        });
    let host = attach_project_volume(project_volume, host);

    let mut builder = ContainerSpec::builder()
        .name(format!("{}-{}", component, definition.alias))
        .image(&definition.image)
        .env_entries(reconcile::encode(&definition.env))
        .label(labels::COMPONENT, component.as_str())
        .label(labels::ALIAS, &definition.alias)
        .host(host);

    if let Some(command) = &definition.command {
        builder = builder.cmd(command.clone());
    }
    if let Some(dir) = &definition.working_dir {
        builder = builder.working_dir(dir);
    }

    builder.build()
}

fn find_by_alias<'a>(
    containers: &'a [ContainerDescriptor],
    alias: &str,
) -> Option<&'a ContainerDescriptor> {
    containers
        .iter()
        .find(|c| c.labels.get(labels::ALIAS).map(String::as_str) == Some(alias))
}

fn project_volume_name(component: &ComponentName) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", component, &suffix[..8])
}
