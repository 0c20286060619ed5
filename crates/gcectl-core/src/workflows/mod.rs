//! Multi-step workflows over [`ComputeApi`](crate::ComputeApi)
//!
//! Each workflow takes the client explicitly and composes submission, waiting,
//! and follow-up reads. None of them polls an operation by hand.

pub mod clone;
pub mod controller;
pub mod existence;
pub mod firewall;
pub mod instance;
pub mod snapshot;

pub use clone::{
    CloneRun, ClonePlan, DEFAULT_CLONE_COUNT, run_clone_pipeline, write_timing_report,
};
pub use controller::{
    BootstrapPlan, ControllerPlan, MetadataPayload, bootstrap_from_metadata, launch_controller,
};
pub use existence::{firewall_exists, instance_exists, snapshot_exists};
pub use firewall::{FirewallOutcome, FirewallRule, ensure_firewall_rule};
pub use instance::{
    ProvisionedInstance, create_instance_and_wait, image_family_link, resolve_image_family,
};
pub use snapshot::{
    SnapshotOutcome, default_snapshot_name, ensure_snapshot, resolve_boot_disk,
    wait_for_snapshot_ready,
};
