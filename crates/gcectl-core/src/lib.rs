//! # gcectl-core
//!
//! Shared engine behind the `gcectl` CLI: profile configuration, a typed
//! client for the Compute Engine v1 control plane, and the multi-step
//! workflows built on top of it.
//!
//! Every mutating call on the control plane returns an [`Operation`] that has
//! to be polled until it reaches `DONE`. [`wait_for_operation`] is the single
//! place that does this; workflows compose submission + wait + follow-up
//! reads and never poll by hand.
//!
//! ## Layers
//!
//! - [`compute`] - resource types, the [`ComputeApi`] seam, and the
//!   reqwest-backed [`ComputeClient`]
//! - [`progress`] - operation waiting with deadlines, cancellation, and
//!   progress events
//! - [`workflows`] - firewall ensure, instance provisioning, snapshot and
//!   clone pipeline, controller launch and metadata bootstrap
//! - [`report`] - creation timing table
//! - [`config`] - TOML profiles and credential resolution
//!
//! ## Example
//!
//! ```rust,ignore
//! use gcectl_core::{ComputeClient, WaitOptions};
//! use gcectl_core::workflows::{ClonePlan, run_clone_pipeline};
//!
//! let client = ComputeClient::builder()
//!     .project("my-project")
//!     .access_token(token)
//!     .build()?;
//!
//! let plan = ClonePlan::new("web-1", "us-west1-b").count(3);
//! let run = run_clone_pipeline(&client, &plan, &WaitOptions::default()).await?;
//! println!("{}", run.report);
//! ```

pub mod compute;
pub mod config;
pub mod error;
pub mod progress;
pub mod report;
pub mod retry;
pub mod workflows;

pub use compute::{
    ComputeApi, ComputeClient, ComputeClientBuilder, Instance, InstanceSpec, Operation,
    OperationErrorDetail, OperationHandle, OperationScope, OperationState, OperationStatus,
    Snapshot, SnapshotStatus,
};
pub use config::{Config, ConfigError, Profile};
pub use error::{CoreError, Result};
pub use progress::{ProgressCallback, ProgressEvent, WaitOptions, wait_for_operation};
pub use report::{TimingReport, TimingRow};
