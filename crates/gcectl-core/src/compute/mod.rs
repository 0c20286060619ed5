//! Compute Engine resources, the [`ComputeApi`] seam, and its HTTP client

pub mod api;
pub mod client;
pub mod spec;
pub mod types;

pub use api::ComputeApi;
pub use client::{ComputeClient, ComputeClientBuilder, DEFAULT_API_URL};
pub use spec::{BootSource, InstanceSpec, STARTUP_SCRIPT_KEY};
pub use types::{
    AttachedDisk, Firewall, FirewallAllowed, Image, Instance, Metadata, MetadataItem, Operation,
    OperationErrorDetail, OperationErrorItem, OperationHandle, OperationScope, OperationState,
    OperationStatus, Snapshot, SnapshotStatus,
};
