//! Compute Engine resource models
//!
//! Only the fields the workflows read or write are modelled. Unknown fields
//! in provider responses are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an operation lives, and therefore which status endpoint serves it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationScope {
    Global,
    Zonal(String),
}

impl OperationScope {
    pub fn zonal(zone: impl Into<String>) -> Self {
        OperationScope::Zonal(zone.into())
    }
}

/// Opaque identity of a submitted operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub id: String,
    pub scope: OperationScope,
    /// Resource the operation mutates, when the provider reports it
    pub target_link: Option<String>,
}

impl OperationHandle {
    pub fn global(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: OperationScope::Global,
            target_link: None,
        }
    }

    pub fn zonal(id: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: OperationScope::zonal(zone),
            target_link: None,
        }
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            OperationScope::Global => write!(f, "global/{}", self.id),
            OperationScope::Zonal(zone) => write!(f, "{}/{}", zone, self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationState {
    Pending,
    Running,
    Done,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Pending => write!(f, "PENDING"),
            OperationState::Running => write!(f, "RUNNING"),
            OperationState::Done => write!(f, "DONE"),
        }
    }
}

/// Structured error attached to a failed operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationErrorDetail {
    #[serde(default)]
    pub errors: Vec<OperationErrorItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationErrorItem {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl OperationErrorDetail {
    pub fn single(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![OperationErrorItem {
                code: code.into(),
                message: message.into(),
                location: None,
            }],
        }
    }
}

impl fmt::Display for OperationErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "unknown error");
        }
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Operation resource as returned by insert/createSnapshot and status polls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    pub status: OperationState,
    /// Zone URL for zonal operations, absent for global ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrorDetail>,
}

/// One polled snapshot of an operation's progress
#[derive(Debug, Clone, PartialEq)]
pub struct OperationStatus {
    pub state: OperationState,
    /// Only present when `state` is `Done` and the operation failed
    pub error_detail: Option<OperationErrorDetail>,
}

impl OperationStatus {
    pub fn is_done(&self) -> bool {
        self.state == OperationState::Done
    }

    pub fn is_failed(&self) -> bool {
        self.is_done() && self.error_detail.is_some()
    }
}

impl Operation {
    /// Handle used to poll this operation; scope follows the `zone` field
    pub fn handle(&self) -> OperationHandle {
        let scope = match self.zone.as_deref().map(last_segment) {
            Some(zone) if !zone.is_empty() => OperationScope::zonal(zone),
            _ => OperationScope::Global,
        };
        OperationHandle {
            id: self.name.clone(),
            scope,
            target_link: self.target_link.clone(),
        }
    }

    pub fn status(&self) -> OperationStatus {
        let error_detail = match (&self.status, &self.error) {
            (OperationState::Done, Some(detail)) if !detail.errors.is_empty() => {
                Some(detail.clone())
            }
            _ => None,
        };
        OperationStatus {
            state: self.status,
            error_detail,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(default)]
    pub disks: Vec<AttachedDisk>,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

impl Instance {
    /// The disk flagged `boot`, or the first disk when none is flagged
    pub fn boot_disk(&self) -> Option<&AttachedDisk> {
        self.disks
            .iter()
            .find(|d| d.boot)
            .or_else(|| self.disks.first())
    }

    /// First one-to-one NAT address, if the instance has one yet
    pub fn external_ip(&self) -> Option<&str> {
        self.network_interfaces
            .iter()
            .flat_map(|nic| nic.access_configs.iter())
            .find_map(|ac| ac.nat_ip.as_deref())
    }

    pub fn tag_items(&self) -> &[String] {
        self.tags.as_ref().map(|t| t.items.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Full or partial URL of the backing disk resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub boot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize_params: Option<InitializeParams>,
}

impl AttachedDisk {
    /// Name of the backing disk, taken from the `source` reference
    ///
    /// The device name is not used: it is chosen by whoever attached the
    /// disk and need not match the disk resource.
    pub fn source_disk_name(&self) -> Option<&str> {
        self.source
            .as_deref()
            .map(last_segment)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snapshot: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "natIP", default, skip_serializing_if = "Option::is_none")]
    pub nat_ip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub items: Vec<String>,
}

/// Key/value bootstrap channel readable by the guest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub items: Vec<MetadataItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    pub value: String,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.value.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceList {
    #[serde(default)]
    pub items: Vec<Instance>,
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    Creating,
    Uploading,
    Ready,
    Failed,
    Deleting,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SnapshotStatus::Creating => "CREATING",
            SnapshotStatus::Uploading => "UPLOADING",
            SnapshotStatus::Ready => "READY",
            SnapshotStatus::Failed => "FAILED",
            SnapshotStatus::Deleting => "DELETING",
            SnapshotStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SnapshotStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_disk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

impl Snapshot {
    /// Request body for createSnapshot
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default)]
    pub self_link: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firewall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default)]
    pub target_tags: Vec<String>,
    #[serde(default)]
    pub source_ranges: Vec<String>,
    #[serde(default)]
    pub allowed: Vec<FirewallAllowed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallAllowed {
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
}

/// Last path segment of a resource URL (`.../disks/web-1` -> `web-1`)
pub fn last_segment(link: &str) -> &str {
    link.trim_end_matches('/').rsplit('/').next().unwrap_or(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_running_zonal_operation() {
        let op: Operation = serde_json::from_value(json!({
            "kind": "compute#operation",
            "name": "operation-1700000000-abc",
            "zone": "https://www.googleapis.com/compute/v1/projects/p/zones/us-west1-b",
            "operationType": "insert",
            "targetLink": "https://www.googleapis.com/compute/v1/projects/p/zones/us-west1-b/instances/web-1",
            "status": "RUNNING",
            "progress": 0
        }))
        .unwrap();

        let handle = op.handle();
        assert_eq!(handle.id, "operation-1700000000-abc");
        assert_eq!(handle.scope, OperationScope::zonal("us-west1-b"));
        assert!(handle.target_link.unwrap().ends_with("/instances/web-1"));
        assert!(!op.status().is_done());
    }

    #[test]
    fn test_global_operation_has_global_scope() {
        let op: Operation = serde_json::from_value(json!({
            "name": "operation-fw",
            "status": "PENDING"
        }))
        .unwrap();
        assert_eq!(op.handle().scope, OperationScope::Global);
        assert_eq!(op.handle().to_string(), "global/operation-fw");
    }

    #[test]
    fn test_done_with_error_is_failed() {
        let op: Operation = serde_json::from_value(json!({
            "name": "operation-2",
            "status": "DONE",
            "error": {
                "errors": [{
                    "code": "ZONE_RESOURCE_POOL_EXHAUSTED",
                    "message": "The zone does not have enough resources"
                }]
            }
        }))
        .unwrap();
        let status = op.status();
        assert!(status.is_failed());
        assert_eq!(
            status.error_detail.unwrap().errors[0].code,
            "ZONE_RESOURCE_POOL_EXHAUSTED"
        );
    }

    #[test]
    fn test_running_operation_never_reports_error_detail() {
        let op = Operation {
            name: "op".to_string(),
            status: OperationState::Running,
            zone: None,
            target_link: None,
            operation_type: None,
            progress: None,
            error: Some(OperationErrorDetail::single("X", "y")),
        };
        assert!(op.status().error_detail.is_none());
    }

    #[test]
    fn test_boot_disk_uses_source_not_device_name() {
        let instance: Instance = serde_json::from_value(json!({
            "name": "src-1",
            "disks": [{
                "deviceName": "persistent-disk-0",
                "boot": true,
                "source": "https://www.googleapis.com/compute/v1/projects/p/zones/z/disks/src-1-disk"
            }]
        }))
        .unwrap();
        let disk = instance.boot_disk().unwrap();
        assert_eq!(disk.source_disk_name(), Some("src-1-disk"));
    }

    #[test]
    fn test_boot_disk_prefers_flagged_disk() {
        let instance: Instance = serde_json::from_value(json!({
            "name": "vm",
            "disks": [
                {"source": "zones/z/disks/data", "boot": false},
                {"source": "zones/z/disks/root", "boot": true}
            ]
        }))
        .unwrap();
        assert_eq!(
            instance.boot_disk().unwrap().source_disk_name(),
            Some("root")
        );
    }

    #[test]
    fn test_external_ip() {
        let instance: Instance = serde_json::from_value(json!({
            "name": "vm",
            "networkInterfaces": [{
                "network": "global/networks/default",
                "accessConfigs": [{"type": "ONE_TO_ONE_NAT", "natIP": "34.1.2.3"}]
            }]
        }))
        .unwrap();
        assert_eq!(instance.external_ip(), Some("34.1.2.3"));
    }

    #[test]
    fn test_snapshot_status_unknown_value() {
        let snap: Snapshot =
            serde_json::from_value(json!({"name": "s", "status": "SOMETHING_NEW"})).unwrap();
        assert_eq!(snap.status, Some(SnapshotStatus::Unknown));
    }

    #[test]
    fn test_firewall_serializes_provider_field_names() {
        let fw = Firewall {
            name: "allow-web".to_string(),
            target_tags: vec!["web".to_string()],
            source_ranges: vec!["0.0.0.0/0".to_string()],
            allowed: vec![FirewallAllowed {
                ip_protocol: "tcp".to_string(),
                ports: vec!["5000".to_string()],
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&fw).unwrap();
        assert_eq!(value["allowed"][0]["IPProtocol"], "tcp");
        assert_eq!(value["targetTags"][0], "web");
        assert_eq!(value["sourceRanges"][0], "0.0.0.0/0");
    }

    #[test]
    fn test_error_detail_display() {
        assert_eq!(OperationErrorDetail::default().to_string(), "unknown error");
        assert_eq!(
            OperationErrorDetail::single("A", "b").to_string(),
            "A: b"
        );
    }
}
