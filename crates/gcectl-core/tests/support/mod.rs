//! In-memory Compute Engine used by the workflow tests
//!
//! Operations finish after a configurable number of polls. Polling a zonal
//! operation on the global endpoint (or the wrong zone) is a 404, as it is
//! against the real API.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use gcectl_core::compute::types::{AccessConfig, NetworkInterface};
use gcectl_core::compute::{
    AttachedDisk, Firewall, Image, Instance, Operation, OperationErrorDetail, OperationState,
    Snapshot, SnapshotStatus,
};
use gcectl_core::{ComputeApi, CoreError, Result};

pub const ZONE: &str = "us-west1-b";
pub const PROJECT: &str = "lab-project";

/// Every call the fake received, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListInstances(String),
    GetInstance(String),
    InsertInstance(String),
    GetImage(String, String),
    CreateSnapshot { disk: String, name: String },
    GetSnapshot(String),
    GetFirewall(String),
    InsertFirewall(String),
    ZonePoll(String),
    GlobalPoll(String),
}

struct FakeOperation {
    zone: Option<String>,
    target: String,
    polls_left: u32,
    error: Option<OperationErrorDetail>,
}

struct FakeSnapshot {
    snapshot: Snapshot,
    reads_until_ready: u32,
}

#[derive(Default)]
struct State {
    instances: BTreeMap<String, Instance>,
    inserted: Vec<Instance>,
    disks: HashSet<String>,
    snapshots: HashMap<String, FakeSnapshot>,
    firewalls: HashMap<String, Firewall>,
    images: HashMap<(String, String), Image>,
    operations: HashMap<String, FakeOperation>,
    calls: Vec<Call>,
    next_op: u32,
    default_polls: u32,
    instance_polls: HashMap<String, u32>,
    failing_instances: HashSet<String>,
    snapshot_reads_until_ready: u32,
    denied: HashSet<String>,
    transient_polls: u32,
}

pub struct FakeCompute {
    project: String,
    state: Mutex<State>,
}

impl Default for FakeCompute {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCompute {
    pub fn new() -> Self {
        Self {
            project: PROJECT.to_string(),
            state: Mutex::new(State {
                default_polls: 1,
                ..Default::default()
            }),
        }
    }

    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// An existing instance whose boot disk is `disk`
    pub fn with_source_instance(self, name: &str, disk: &str) -> Self {
        let instance = Instance {
            name: name.to_string(),
            status: Some("RUNNING".to_string()),
            disks: vec![AttachedDisk {
                device_name: Some("persistent-disk-0".to_string()),
                source: Some(format!(
                    "https://www.googleapis.com/compute/v1/projects/{}/zones/{}/disks/{}",
                    PROJECT, ZONE, disk
                )),
                boot: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        self.with_state(|s| {
            s.disks.insert(disk.to_string());
            s.instances.insert(name.to_string(), instance);
        })
    }

    pub fn with_instance(self, name: &str) -> Self {
        self.with_source_instance(name, name)
    }

    pub fn with_snapshot(self, name: &str, status: SnapshotStatus, reads_until_ready: u32) -> Self {
        self.with_state(|s| {
            s.snapshots.insert(
                name.to_string(),
                FakeSnapshot {
                    snapshot: Snapshot {
                        name: name.to_string(),
                        status: Some(status),
                        ..Default::default()
                    },
                    reads_until_ready,
                },
            );
        })
    }

    pub fn with_firewall(self, name: &str) -> Self {
        self.with_state(|s| {
            s.firewalls.insert(
                name.to_string(),
                Firewall {
                    name: name.to_string(),
                    ..Default::default()
                },
            );
        })
    }

    pub fn with_image(self, project: &str, family: &str, name: &str) -> Self {
        self.with_state(|s| {
            s.images.insert(
                (project.to_string(), family.to_string()),
                Image {
                    name: name.to_string(),
                    family: Some(family.to_string()),
                    self_link: format!("projects/{}/global/images/{}", project, name),
                },
            );
        })
    }

    /// Polls every operation answers `RUNNING` before `DONE`
    pub fn with_default_polls(self, polls: u32) -> Self {
        self.with_state(|s| s.default_polls = polls)
    }

    /// Polls the insert of instance `name` answers `RUNNING` before `DONE`
    pub fn with_instance_polls(self, name: &str, polls: u32) -> Self {
        self.with_state(|s| {
            s.instance_polls.insert(name.to_string(), polls);
        })
    }

    /// Inserting `name` ends in `DONE` with an error payload
    pub fn with_failing_instance(self, name: &str) -> Self {
        self.with_state(|s| {
            s.failing_instances.insert(name.to_string());
        })
    }

    /// Reads of a newly created snapshot before it reports `READY`
    pub fn with_snapshot_reads_until_ready(self, reads: u32) -> Self {
        self.with_state(|s| s.snapshot_reads_until_ready = reads)
    }

    /// Lookups of `name` fail with 403
    pub fn with_denied(self, name: &str) -> Self {
        self.with_state(|s| {
            s.denied.insert(name.to_string());
        })
    }

    /// The next `count` operation polls fail with a transient error
    pub fn with_transient_polls(self, count: u32) -> Self {
        self.with_state(|s| s.transient_polls = count)
    }

    /// Register an operation directly, for waiter tests
    pub fn operation(
        &self,
        zone: Option<&str>,
        polls: u32,
        error: Option<OperationErrorDetail>,
    ) -> Operation {
        let mut s = self.state.lock().unwrap();
        new_operation(&mut s, zone, "manual".to_string(), polls, error)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    /// Instance bodies submitted through insert, in order
    pub fn inserted(&self) -> Vec<Instance> {
        self.state.lock().unwrap().inserted.clone()
    }

    pub fn inserted_names(&self) -> Vec<String> {
        self.inserted().into_iter().map(|i| i.name).collect()
    }

    pub fn snapshot_creations(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateSnapshot { disk, name } => Some((disk, name)),
                _ => None,
            })
            .collect()
    }

    pub fn instance_count(&self) -> usize {
        self.state.lock().unwrap().instances.len()
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, State> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(call);
        s
    }
}

fn new_operation(
    s: &mut State,
    zone: Option<&str>,
    target: String,
    polls: u32,
    error: Option<OperationErrorDetail>,
) -> Operation {
    s.next_op += 1;
    let name = format!("operation-{}", s.next_op);
    s.operations.insert(
        name.clone(),
        FakeOperation {
            zone: zone.map(str::to_string),
            target: target.clone(),
            polls_left: polls,
            error,
        },
    );
    Operation {
        name,
        status: OperationState::Pending,
        zone: zone.map(|z| {
            format!(
                "https://www.googleapis.com/compute/v1/projects/{}/zones/{}",
                PROJECT, z
            )
        }),
        target_link: Some(target),
        operation_type: None,
        progress: None,
        error: None,
    }
}

fn poll(s: &mut State, name: &str, zone: Option<&str>) -> Result<Operation> {
    if s.transient_polls > 0 {
        s.transient_polls -= 1;
        return Err(CoreError::Transient("HTTP 503: backend unavailable".to_string()));
    }

    let op = match s.operations.get_mut(name) {
        Some(op) if op.zone.as_deref() == zone => op,
        _ => return Err(CoreError::NotFound(format!("operation {}", name))),
    };

    let status = if op.polls_left > 0 {
        op.polls_left -= 1;
        OperationState::Running
    } else {
        OperationState::Done
    };

    Ok(Operation {
        name: name.to_string(),
        status,
        zone: op.zone.clone(),
        target_link: Some(op.target.clone()),
        operation_type: None,
        progress: None,
        error: match status {
            OperationState::Done => op.error.clone(),
            _ => None,
        },
    })
}

fn denied(name: &str) -> CoreError {
    CoreError::from_status(403, format!("Required permission for '{}'", name))
}

#[async_trait]
impl ComputeApi for FakeCompute {
    fn project(&self) -> &str {
        &self.project
    }

    async fn list_instances(&self, zone: &str) -> Result<Vec<Instance>> {
        let s = self.record(Call::ListInstances(zone.to_string()));
        Ok(s.instances.values().cloned().collect())
    }

    async fn get_instance(&self, _zone: &str, name: &str) -> Result<Instance> {
        let s = self.record(Call::GetInstance(name.to_string()));
        if s.denied.contains(name) {
            return Err(denied(name));
        }
        s.instances
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("instance {}", name)))
    }

    async fn insert_instance(&self, zone: &str, instance: &Instance) -> Result<Operation> {
        let mut s = self.record(Call::InsertInstance(instance.name.clone()));
        if s.instances.contains_key(&instance.name) {
            return Err(CoreError::Conflict(format!("instance {}", instance.name)));
        }
        s.inserted.push(instance.clone());

        let polls = s
            .instance_polls
            .get(&instance.name)
            .copied()
            .unwrap_or(s.default_polls);
        let error = s.failing_instances.contains(&instance.name).then(|| {
            OperationErrorDetail::single("QUOTA_EXCEEDED", "Quota 'CPUS' exceeded")
        });

        if error.is_none() {
            let n = s.instances.len() + 1;
            let mut created = instance.clone();
            created.status = Some("RUNNING".to_string());
            created.network_interfaces = vec![NetworkInterface {
                network: Some("global/networks/default".to_string()),
                access_configs: vec![AccessConfig {
                    kind: Some("ONE_TO_ONE_NAT".to_string()),
                    name: Some("External NAT".to_string()),
                    nat_ip: Some(format!("203.0.113.{}", n)),
                }],
            }];
            s.instances.insert(instance.name.clone(), created);
        }

        let target = format!("instances/{}", instance.name);
        Ok(new_operation(&mut s, Some(zone), target, polls, error))
    }

    async fn get_image_from_family(&self, image_project: &str, family: &str) -> Result<Image> {
        let s = self.record(Call::GetImage(
            image_project.to_string(),
            family.to_string(),
        ));
        s.images
            .get(&(image_project.to_string(), family.to_string()))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("image family {}", family)))
    }

    async fn create_snapshot(
        &self,
        zone: &str,
        disk: &str,
        snapshot: &Snapshot,
    ) -> Result<Operation> {
        let mut s = self.record(Call::CreateSnapshot {
            disk: disk.to_string(),
            name: snapshot.name.clone(),
        });
        if !s.disks.contains(disk) {
            return Err(CoreError::NotFound(format!("disk {}", disk)));
        }
        if s.snapshots.contains_key(&snapshot.name) {
            return Err(CoreError::Conflict(format!("snapshot {}", snapshot.name)));
        }

        let reads = s.snapshot_reads_until_ready;
        s.snapshots.insert(
            snapshot.name.clone(),
            FakeSnapshot {
                snapshot: Snapshot {
                    name: snapshot.name.clone(),
                    status: Some(SnapshotStatus::Creating),
                    source_disk: Some(format!("zones/{}/disks/{}", zone, disk)),
                    self_link: Some(format!(
                        "https://www.googleapis.com/compute/v1/projects/{}/global/snapshots/{}",
                        PROJECT, snapshot.name
                    )),
                },
                reads_until_ready: reads,
            },
        );
        let polls = s.default_polls;
        let target = format!("disks/{}", disk);
        Ok(new_operation(&mut s, Some(zone), target, polls, None))
    }

    async fn get_snapshot(&self, name: &str) -> Result<Snapshot> {
        let mut s = self.record(Call::GetSnapshot(name.to_string()));
        if s.denied.contains(name) {
            return Err(denied(name));
        }
        let entry = s
            .snapshots
            .get_mut(name)
            .ok_or_else(|| CoreError::NotFound(format!("snapshot {}", name)))?;

        let transitional = matches!(
            entry.snapshot.status,
            Some(SnapshotStatus::Creating | SnapshotStatus::Uploading)
        );
        if transitional {
            if entry.reads_until_ready == 0 {
                entry.snapshot.status = Some(SnapshotStatus::Ready);
            } else {
                entry.reads_until_ready -= 1;
            }
        }
        Ok(entry.snapshot.clone())
    }

    async fn get_firewall(&self, name: &str) -> Result<Firewall> {
        let s = self.record(Call::GetFirewall(name.to_string()));
        if s.denied.contains(name) {
            return Err(denied(name));
        }
        s.firewalls
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("firewall {}", name)))
    }

    async fn insert_firewall(&self, firewall: &Firewall) -> Result<Operation> {
        let mut s = self.record(Call::InsertFirewall(firewall.name.clone()));
        if s.firewalls.contains_key(&firewall.name) {
            return Err(CoreError::Conflict(format!(
                "The resource 'projects/{}/global/firewalls/{}' already exists",
                PROJECT, firewall.name
            )));
        }
        s.firewalls.insert(firewall.name.clone(), firewall.clone());
        let polls = s.default_polls;
        let target = format!("firewalls/{}", firewall.name);
        Ok(new_operation(&mut s, None, target, polls, None))
    }

    async fn get_zone_operation(&self, zone: &str, operation: &str) -> Result<Operation> {
        let mut s = self.record(Call::ZonePoll(operation.to_string()));
        poll(&mut s, operation, Some(zone))
    }

    async fn get_global_operation(&self, operation: &str) -> Result<Operation> {
        let mut s = self.record(Call::GlobalPoll(operation.to_string()));
        poll(&mut s, operation, None)
    }
}
