//! Push orchestration tests against an in-memory runtime.

use async_trait::async_trait;
use devsync::launch::ContainerSpec;
use devsync::lookup::{ContainerDescriptor, LabelSelector, VolumeDescriptor};
use devsync::runtime::{ContainerError, ContainerRuntime, ContainerSnapshot, Result};
use devsync::{
    ComponentAdapter, ComponentManifest, ContainerStatus, PushAction, RecreateReason,
    RuntimeMountPoint,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    containers: Vec<(ContainerDescriptor, ContainerSnapshot)>,
    volumes: Vec<VolumeDescriptor>,
    fail_listing: bool,
    next_id: u32,
    removed: Vec<String>,
}

#[derive(Default)]
struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    fn container_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.containers.iter().map(|(d, _)| d.id.clone()).collect()
    }

    fn removed(&self) -> Vec<String> {
        self.state.lock().unwrap().removed.clone()
    }

    fn volume_count(&self) -> usize {
        self.state.lock().unwrap().volumes.len()
    }

    fn set_fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    fn snapshot(&self, id: &str) -> ContainerSnapshot {
        let state = self.state.lock().unwrap();
        state
            .containers
            .iter()
            .find(|(d, _)| d.id == id)
            .map(|(_, s)| s.clone())
            .unwrap()
    }

    /// Simulate drift of a running container's reported configuration.
    fn tamper<F: FnOnce(&mut ContainerSnapshot)>(&self, id: &str, f: F) {
        let mut state = self.state.lock().unwrap();
        let (_, snapshot) = state
            .containers
            .iter_mut()
            .find(|(d, _)| d.id == id)
            .unwrap();
        f(snapshot);
    }

    /// Set the reported state of every container, as after a host reboot.
    fn set_all_states(&self, new_state: &str) {
        let mut state = self.state.lock().unwrap();
        for (descriptor, _) in &mut state.containers {
            descriptor.state = new_state.to_string();
        }
    }

    fn states(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.containers.iter().map(|(d, _)| d.state.clone()).collect()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(ContainerError::Other("daemon unreachable".to_string()));
        }
        Ok(state.containers.iter().map(|(d, _)| d.clone()).collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerSnapshot> {
        let state = self.state.lock().unwrap();
        state
            .containers
            .iter()
            .find(|(d, _)| d.id == id)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("container-{}", state.next_id);
        let labels: HashMap<String, String> = spec
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let descriptor = ContainerDescriptor {
            id: id.clone(),
            state: "running".to_string(),
            labels,
        };
        let snapshot = ContainerSnapshot {
            id: id.clone(),
            config: devsync::RuntimeContainerConfig {
                image: spec.image.clone(),
                env: spec.env.clone(),
            },
            mounts: spec
                .host
                .mounts
                .iter()
                .map(|m| RuntimeMountPoint::new(&m.source, &m.target))
                .collect(),
        };
        state.containers.push((descriptor, snapshot));
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let (descriptor, _) = state
            .containers
            .iter_mut()
            .find(|(d, _)| d.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        descriptor.state = "running".to_string();
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.containers.len();
        state.containers.retain(|(d, _)| d.id != id);
        if state.containers.len() == before {
            return Err(ContainerError::NotFound(id.to_string()));
        }
        state.removed.push(id.to_string());
        Ok(())
    }

    async fn list_volumes(&self, _selector: &LabelSelector) -> Result<Vec<VolumeDescriptor>> {
        // Return everything; the adapter applies the selector itself
        Ok(self.state.lock().unwrap().volumes.clone())
    }

    async fn create_volume(&self, name: &str, labels: &HashMap<String, String>) -> Result<String> {
        self.state.lock().unwrap().volumes.push(VolumeDescriptor {
            name: name.to_string(),
            driver: "local".to_string(),
            labels: labels.clone(),
        });
        Ok(name.to_string())
    }
}

const MANIFEST: &str = r#"
name = "web"

[[containers]]
alias = "runtime"
image = "node:12"
env = [{ name = "FOO", value = "bar" }]
mounts = [{ source = "cache", target = "/cache" }]

[[containers]]
alias = "db"
image = "postgres:13"
"#;

fn manifest() -> ComponentManifest {
    ComponentManifest::from_toml_str(MANIFEST).unwrap()
}

fn with_image(alias: &str, image: &str) -> ComponentManifest {
    let mut manifest = manifest();
    for container in &mut manifest.containers {
        if container.alias == alias {
            container.image = image.to_string();
        }
    }
    manifest
}

#[tokio::test]
async fn test_first_push_creates_everything() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    assert!(!adapter.exists().await);

    let report = adapter.push().await.unwrap();

    assert_eq!(report.component.as_str(), "web");
    assert!(report.project_volume.starts_with("web-"));
    assert_eq!(report.actions.len(), 2);
    assert!(
        report
            .actions
            .iter()
            .all(|(_, a)| matches!(a, PushAction::Created { .. }))
    );
    assert!(adapter.exists().await);

    let runtime = adapter.runtime();
    assert_eq!(runtime.volume_count(), 1);
    let snapshot = runtime.snapshot("container-1");
    assert!(snapshot.config.env.contains(&"FOO=bar".to_string()));
    assert!(
        snapshot
            .mounts
            .contains(&RuntimeMountPoint::new(&report.project_volume, "/projects"))
    );
}

#[tokio::test]
async fn test_second_push_leaves_containers_alone() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    let first = adapter.push().await.unwrap();
    let second = adapter.push().await.unwrap();

    assert_eq!(first.project_volume, second.project_volume);
    assert!(
        second
            .actions
            .iter()
            .all(|(_, a)| matches!(a, PushAction::Unchanged { .. }))
    );
    assert_eq!(adapter.runtime().volume_count(), 1);
    assert!(adapter.runtime().removed().is_empty());
}

#[tokio::test]
async fn test_image_change_recreates_only_that_container() {
    let runtime = FakeRuntime::default();
    let adapter = ComponentAdapter::new(runtime, manifest());
    adapter.push().await.unwrap();

    // Same runtime, new declaration
    let runtime = std::mem::take(&mut *adapter.runtime().state.lock().unwrap());
    let fake = FakeRuntime {
        state: Mutex::new(runtime),
    };
    let adapter = ComponentAdapter::new(fake, with_image("runtime", "node:14"));
    let report = adapter.push().await.unwrap();

    let (alias, action) = &report.actions[0];
    assert_eq!(alias, "runtime");
    match action {
        PushAction::Recreated { reason, .. } => assert_eq!(
            reason,
            &RecreateReason::Image {
                declared: "node:14".to_string(),
                actual: "node:12".to_string(),
            }
        ),
        other => panic!("unexpected action: {:?}", other),
    }
    assert!(matches!(report.actions[1].1, PushAction::Unchanged { .. }));
    assert_eq!(adapter.runtime().removed(), vec!["container-1".to_string()]);
    assert_eq!(adapter.runtime().container_ids().len(), 2);
}

#[tokio::test]
async fn test_extra_runtime_env_is_ignored() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    adapter.push().await.unwrap();

    adapter.runtime().tamper("container-1", |snapshot| {
        snapshot.config.env.push("PATH=/usr/bin".to_string());
    });

    let statuses = adapter.check().await.unwrap();
    assert!(matches!(statuses[0].1, ContainerStatus::InSync { .. }));
}

#[tokio::test]
async fn test_check_reports_missing_env() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    adapter.push().await.unwrap();

    adapter.runtime().tamper("container-1", |snapshot| {
        snapshot.config.env.clear();
    });

    let statuses = adapter.check().await.unwrap();
    assert_eq!(
        statuses[0],
        (
            "runtime".to_string(),
            ContainerStatus::Stale {
                id: "container-1".to_string(),
                reason: RecreateReason::Env {
                    entry: "FOO=bar".to_string()
                },
            }
        )
    );
    // Nothing changed
    assert!(adapter.runtime().removed().is_empty());
}

#[tokio::test]
async fn test_check_before_push() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    let statuses = adapter.check().await.unwrap();

    assert_eq!(statuses.len(), 2);
    assert!(statuses.iter().all(|(_, s)| *s == ContainerStatus::Missing));
    assert_eq!(adapter.runtime().volume_count(), 0);
}

#[tokio::test]
async fn test_listing_failure_treated_as_absent() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    adapter.push().await.unwrap();
    assert!(adapter.exists().await);

    adapter.runtime().set_fail_listing(true);
    assert!(!adapter.exists().await);

    let statuses = adapter.check().await.unwrap();
    assert!(statuses.iter().all(|(_, s)| *s == ContainerStatus::Missing));
}

#[tokio::test]
async fn test_other_components_are_not_touched() {
    let runtime = FakeRuntime::default();
    let other = ComponentManifest::from_toml_str(
        "name = \"api\"\n[[containers]]\nalias = \"runtime\"\nimage = \"golang:1.14\"\n",
    )
    .unwrap();

    let api = ComponentAdapter::new(runtime, other);
    api.push().await.unwrap();

    let state = std::mem::take(&mut *api.runtime().state.lock().unwrap());
    let web = ComponentAdapter::new(
        FakeRuntime {
            state: Mutex::new(state),
        },
        manifest(),
    );
    let report = web.push().await.unwrap();

    assert!(
        report
            .actions
            .iter()
            .all(|(_, a)| matches!(a, PushAction::Created { .. }))
    );
    assert_eq!(web.runtime().volume_count(), 2);
    assert!(web.runtime().removed().is_empty());
}

#[tokio::test]
async fn test_push_starts_stopped_containers() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    adapter.push().await.unwrap();

    adapter.runtime().set_all_states("exited");

    let statuses = adapter.check().await.unwrap();
    assert!(
        statuses
            .iter()
            .all(|(_, s)| matches!(s, ContainerStatus::Stopped { .. }))
    );

    let report = adapter.push().await.unwrap();
    assert_eq!(
        report.actions,
        vec![
            (
                "runtime".to_string(),
                PushAction::Started {
                    id: "container-1".to_string()
                }
            ),
            (
                "db".to_string(),
                PushAction::Started {
                    id: "container-2".to_string()
                }
            ),
        ]
    );
    assert_eq!(adapter.runtime().states(), vec!["running", "running"]);
    assert!(adapter.runtime().removed().is_empty());

    let report = adapter.push().await.unwrap();
    assert!(
        report
            .actions
            .iter()
            .all(|(_, a)| matches!(a, PushAction::Unchanged { .. }))
    );
}

#[tokio::test]
async fn test_stopped_and_stale_container_is_recreated() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    adapter.push().await.unwrap();

    adapter.runtime().set_all_states("exited");
    adapter.runtime().tamper("container-1", |snapshot| {
        snapshot.config.env.clear();
    });

    let report = adapter.push().await.unwrap();
    assert!(matches!(report.actions[0].1, PushAction::Recreated { .. }));
    assert!(matches!(report.actions[1].1, PushAction::Started { .. }));
    assert_eq!(adapter.runtime().removed(), vec!["container-1".to_string()]);
}

#[tokio::test]
async fn test_lost_project_volume_triggers_recreation() {
    let adapter = ComponentAdapter::new(FakeRuntime::default(), manifest());
    let first = adapter.push().await.unwrap();

    adapter.runtime().tamper("container-1", |snapshot| {
        snapshot.mounts.retain(|m| m.destination != "/projects");
    });

    let report = adapter.push().await.unwrap();
    let (alias, action) = &report.actions[0];
    assert_eq!(alias, "runtime");
    match action {
        PushAction::Recreated { reason, .. } => assert_eq!(
            reason,
            &RecreateReason::Mount {
                source: first.project_volume.clone(),
                target: "/projects".to_string(),
            }
        ),
        other => panic!("unexpected action: {:?}", other),
    }
    assert!(matches!(report.actions[1].1, PushAction::Unchanged { .. }));

    let recreated = adapter.runtime().container_ids().last().cloned().unwrap();
    assert!(
        adapter
            .runtime()
            .snapshot(&recreated)
            .mounts
            .contains(&RuntimeMountPoint::new(&first.project_volume, "/projects"))
    );
}
