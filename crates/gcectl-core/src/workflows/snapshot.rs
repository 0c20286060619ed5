//! Boot-disk snapshots

use tracing::info;

use crate::compute::{ComputeApi, OperationErrorDetail, Snapshot, SnapshotStatus};
use crate::error::{CoreError, Result};
use crate::progress::{Poller, WaitOptions, wait_for_operation};

use super::existence::snapshot_exists;

/// Result of [`ensure_snapshot`]
#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    /// The snapshot as last read, always `READY`
    pub snapshot: Snapshot,
    /// Disk the snapshot was taken from, when known
    pub disk: Option<String>,
    /// `false` when an existing snapshot was reused
    pub created: bool,
}

/// Snapshot name used when none is given: `base-snapshot-<instance>`
pub fn default_snapshot_name(source_instance: &str) -> String {
    format!("base-snapshot-{}", source_instance)
}

/// Name of the disk backing an instance's boot device
///
/// Taken from the attached disk's `source` reference. The disk name is
/// unrelated to both the instance name and the device name.
pub async fn resolve_boot_disk(api: &dyn ComputeApi, zone: &str, instance: &str) -> Result<String> {
    let instance = api.get_instance(zone, instance).await?;
    instance
        .boot_disk()
        .and_then(|disk| disk.source_disk_name())
        .map(str::to_string)
        .ok_or_else(|| {
            CoreError::InvalidResponse(format!(
                "instance {} has no boot disk with a source reference",
                instance.name
            ))
        })
}

/// Snapshot the boot disk of `source_instance` as `snapshot_name`, reusing it if present
///
/// The source instance is only read when a snapshot has to be taken, so a
/// reused snapshot outlives its instance. Readiness is polled whether or not
/// the snapshot was created here, so a reused snapshot still in `CREATING`
/// or `UPLOADING` is waited for.
pub async fn ensure_snapshot(
    api: &dyn ComputeApi,
    zone: &str,
    source_instance: &str,
    snapshot_name: &str,
    options: &WaitOptions,
) -> Result<SnapshotOutcome> {
    let taken_from = if snapshot_exists(api, snapshot_name).await? {
        info!("Snapshot {} already exists, reusing it", snapshot_name);
        None
    } else {
        let disk = resolve_boot_disk(api, zone, source_instance).await?;
        info!("Creating snapshot {} from disk {}", snapshot_name, disk);
        let operation = api
            .create_snapshot(zone, &disk, &Snapshot::named(snapshot_name))
            .await?;
        wait_for_operation(api, &operation.handle(), options).await?;
        Some(disk)
    };

    let snapshot = wait_for_snapshot_ready(api, snapshot_name, options).await?;
    let created = taken_from.is_some();
    let disk = taken_from.or_else(|| {
        snapshot
            .source_disk
            .as_deref()
            .and_then(|link| link.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    });
    Ok(SnapshotOutcome {
        snapshot,
        disk,
        created,
    })
}

/// Poll a snapshot resource until its status is `READY`
pub async fn wait_for_snapshot_ready(
    api: &dyn ComputeApi,
    name: &str,
    options: &WaitOptions,
) -> Result<Snapshot> {
    let poller = Poller::start(options, format!("snapshot/{}", name));

    loop {
        let snapshot = poller.query(api.get_snapshot(name)).await?;
        let status = snapshot.status.unwrap_or(SnapshotStatus::Unknown);
        poller.polled(status.to_string());

        match status {
            SnapshotStatus::Ready => {
                poller.completed();
                return Ok(snapshot);
            }
            SnapshotStatus::Failed => {
                return Err(poller.fail(CoreError::OperationFailed {
                    operation: format!("snapshot/{}", name),
                    detail: OperationErrorDetail::single(
                        "SNAPSHOT_FAILED",
                        format!("snapshot {} entered FAILED", name),
                    ),
                }));
            }
            _ => poller.pause().await?,
        }
    }
}
