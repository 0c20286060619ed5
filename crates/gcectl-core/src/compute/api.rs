//! The control-plane seam
//!
//! Workflows only talk to [`ComputeApi`]. [`ComputeClient`](super::ComputeClient)
//! implements it over HTTP; tests implement it in memory.

use async_trait::async_trait;

use super::types::{Firewall, Image, Instance, Operation, Snapshot};
use crate::error::Result;

/// Calls against a single project's Compute Engine resources
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Project every call is scoped to
    fn project(&self) -> &str;

    async fn list_instances(&self, zone: &str) -> Result<Vec<Instance>>;

    async fn get_instance(&self, zone: &str, name: &str) -> Result<Instance>;

    async fn insert_instance(&self, zone: &str, instance: &Instance) -> Result<Operation>;

    /// Latest non-deprecated image of `family` in `image_project`
    async fn get_image_from_family(&self, image_project: &str, family: &str) -> Result<Image>;

    async fn create_snapshot(&self, zone: &str, disk: &str, snapshot: &Snapshot)
    -> Result<Operation>;

    async fn get_snapshot(&self, name: &str) -> Result<Snapshot>;

    async fn get_firewall(&self, name: &str) -> Result<Firewall>;

    async fn insert_firewall(&self, firewall: &Firewall) -> Result<Operation>;

    async fn get_zone_operation(&self, zone: &str, operation: &str) -> Result<Operation>;

    async fn get_global_operation(&self, operation: &str) -> Result<Operation>;
}
