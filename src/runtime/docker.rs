//! Docker/Podman runtime backed by bollard.
//!
//! Connects to the local daemon with automatic Podman fallback and translates
//! between bollard's API models and the crate's runtime types.

use crate::component::{RuntimeContainerConfig, RuntimeMountPoint};
use crate::launch::{ContainerSpec, HostLaunchConfig};
use crate::lookup::{ContainerDescriptor, LabelSelector, VolumeDescriptor};
use crate::runtime::{ContainerError, ContainerRuntime, ContainerSnapshot, Result, RuntimeConfig};
use async_trait::async_trait;
use bollard::Docker;
use bollard::service::{HostConfig, Mount, MountTypeEnum};
use futures::stream::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info};

/// Container runtime talking to a Docker or Podman daemon.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
    config: RuntimeConfig,
}

impl DockerRuntime {
    /// Connect with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if neither Docker nor Podman are available.
    pub async fn new() -> Result<Self> {
        Self::with_config(RuntimeConfig::default()).await
    }

    /// Connect with custom settings and verify the daemon answers.
    ///
    /// # Errors
    ///
    /// Returns error if connection or ping fails.
    pub async fn with_config(config: RuntimeConfig) -> Result<Self> {
        let docker = Self::connect(&config)?;
        let runtime = Self { docker, config };
        runtime.ping().await?;
        Ok(runtime)
    }

    /// Wrap an existing bollard connection.
    pub fn with_docker(docker: Docker, config: RuntimeConfig) -> Self {
        Self { docker, config }
    }

    /// Connect to Docker or Podman daemon.
    ///
    /// An explicit socket wins; otherwise tries local defaults, then the
    /// rootless and system Podman sockets.
    fn connect(config: &RuntimeConfig) -> Result<Docker> {
        if let Some(socket) = &config.socket {
            debug!("Connecting to configured socket: {}", socket);
            return Docker::connect_with_socket(
                socket,
                config.timeout,
                bollard::API_DEFAULT_VERSION,
            )
            .map_err(ContainerError::ApiError);
        }

        match Docker::connect_with_local_defaults() {
            Ok(docker) => {
                info!("Connected to container runtime via local defaults");
                return Ok(docker);
            }
            Err(e) => {
                debug!("Local defaults failed: {}", e);
            }
        }

        #[cfg(unix)]
        {
            let mut sockets = Vec::new();
            if let Ok(home) = std::env::var("HOME") {
                sockets.push(format!("unix://{}/run/podman/podman.sock", home));
            }
            sockets.push("unix:///run/podman/podman.sock".to_string());

            for socket in sockets {
                debug!("Trying Podman socket: {}", socket);
                match Docker::connect_with_socket(
                    &socket,
                    config.timeout,
                    bollard::API_DEFAULT_VERSION,
                ) {
                    Ok(docker) => {
                        info!("Connected to Podman via {}", socket);
                        return Ok(docker);
                    }
                    Err(e) => {
                        debug!("Podman socket {} failed: {}", socket, e);
                    }
                }
            }
        }

        Err(ContainerError::Other(
            "Failed to connect to Docker or Podman. Please ensure Docker or Podman is installed and running.".to_string()
        ))
    }

    /// Ping the daemon.
    ///
    /// # Errors
    ///
    /// Returns error if ping fails.
    pub async fn ping(&self) -> Result<()> {
        self.docker.ping().await.map_err(|e| {
            ContainerError::Other(format!("Failed to ping container runtime: {}", e))
        })?;
        debug!("Container runtime ping successful");
        Ok(())
    }

    /// Get the underlying bollard client.
    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// Check if an image exists locally.
    ///
    /// # Errors
    ///
    /// Returns error if image inspection fails.
    pub async fn image_exists(&self, image: &str) -> Result<bool> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ContainerError::ApiError(e)),
        }
    }

    /// Pull an image unless it is already present.
    ///
    /// # Errors
    ///
    /// Returns error if image pull fails.
    pub async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.image_exists(image).await? {
            debug!("Image {} already exists locally", image);
            return Ok(());
        }

        info!("Pulling image: {}", image);
        let mut stream = self.docker.create_image(
            Some(bollard::image::CreateImageOptions {
                from_image: image,
                ..Default::default()
            }),
            None,
            None,
        );

        while let Some(result) = stream.next().await {
            let info = result?;
            if let Some(status) = info.status {
                debug!("Pull status: {}", status);
            }
        }

        info!("Successfully pulled image: {}", image);
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>> {
        let containers = self
            .docker
            .list_containers(Some(bollard::container::ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerDescriptor {
                id: c.id.unwrap_or_default(),
                state: c.state.map(|s| s.to_string()).unwrap_or_default(),
                labels: c.labels.unwrap_or_default(),
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerSnapshot> {
        let inspect = self
            .docker
            .inspect_container(id, None::<bollard::query_parameters::InspectContainerOptions>)
            .await
            .map_err(|e| match e {
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                } => ContainerError::NotFound(id.to_string()),
                e => ContainerError::ApiError(e),
            })?;

        let config = inspect
            .config
            .ok_or_else(|| ContainerError::Other(format!("Container {} has no config", id)))?;

        let mounts = inspect
            .mounts
            .unwrap_or_default()
            .into_iter()
            .map(|m| RuntimeMountPoint {
                name: m.name.unwrap_or_default(),
                destination: m.destination.unwrap_or_default(),
            })
            .collect();

        Ok(ContainerSnapshot {
            id: inspect.id.unwrap_or_else(|| id.to_string()),
            config: RuntimeContainerConfig {
                image: config.image.unwrap_or_default(),
                env: config.env.unwrap_or_default(),
            },
            mounts,
        })
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        if self.config.auto_pull {
            self.ensure_image(&spec.image).await?;
        }

        let container_name = spec
            .name
            .clone()
            .unwrap_or_else(|| format!("devsync-{}", uuid::Uuid::new_v4()));

        let options = bollard::container::CreateContainerOptions {
            name: container_name.as_str(),
            ..Default::default()
        };

        use bollard::container::Config as BollardConfig;

        let bollard_config = BollardConfig {
            image: Some(spec.image.clone()),
            cmd: spec.cmd.clone(),
            working_dir: spec.working_dir.clone(),
            env: if spec.env.is_empty() {
                None
            } else {
                Some(spec.env.clone())
            },
            labels: Some(
                spec.labels
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            host_config: Some(host_config(&spec.host)),
            ..Default::default()
        };

        debug!("Creating container: {}", container_name);
        let response = self
            .docker
            .create_container(Some(options), bollard_config)
            .await?;
        info!("Created container: {} ({})", container_name, response.id);

        self.start_container(&response.id).await?;
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<bollard::container::StartContainerOptions<String>>)
            .await
            .map_err(|e| match e {
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                } => ContainerError::NotFound(id.to_string()),
                e => ContainerError::ApiError(e),
            })?;
        info!("Started container: {}", id);
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        debug!("Removing container: {}", id);
        self.docker
            .remove_container(
                id,
                Some(bollard::container::RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        info!("Removed container: {}", id);
        Ok(())
    }

    async fn list_volumes(&self, selector: &LabelSelector) -> Result<Vec<VolumeDescriptor>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), selector.to_filters());

        let response = self
            .docker
            .list_volumes(Some(bollard::volume::ListVolumesOptions { filters }))
            .await?;

        Ok(response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|v| VolumeDescriptor {
                name: v.name,
                driver: v.driver,
                labels: v.labels,
            })
            .collect())
    }

    async fn create_volume(&self, name: &str, labels: &HashMap<String, String>) -> Result<String> {
        debug!("Creating volume: {}", name);

        let labels: HashMap<&str, &str> = labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let response = self
            .docker
            .create_volume(bollard::volume::CreateVolumeOptions {
                name,
                driver: "local",
                driver_opts: HashMap::new(),
                labels,
            })
            .await
            .map_err(|e| ContainerError::VolumeError(format!("{}: {}", name, e)))?;

        info!("Created volume: {}", response.name);
        Ok(response.name)
    }
}

/// Translate a launch configuration into bollard's host config.
fn host_config(host: &HostLaunchConfig) -> HostConfig {
    let mounts: Vec<Mount> = host
        .mounts
        .iter()
        .map(|m| Mount {
            target: Some(m.target.clone()),
            source: Some(m.source.clone()),
            typ: Some(MountTypeEnum::VOLUME),
            ..Default::default()
        })
        .collect();

    HostConfig {
        mounts: if mounts.is_empty() { None } else { Some(mounts) },
        ..Default::default()
    }
}
