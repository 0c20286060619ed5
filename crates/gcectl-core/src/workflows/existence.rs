//! Existence checks used to make workflows safe to re-run

use std::future::Future;

use crate::compute::ComputeApi;
use crate::error::Result;

/// Turn a lookup into a presence check
///
/// `NotFound` becomes `Ok(false)`. Every other error (authorization, quota,
/// transient) is returned unchanged so it cannot be mistaken for absence.
pub async fn found<T, F>(lookup: F) -> Result<bool>
where
    F: Future<Output = Result<T>>,
{
    match lookup.await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn snapshot_exists(api: &dyn ComputeApi, name: &str) -> Result<bool> {
    found(api.get_snapshot(name)).await
}

pub async fn instance_exists(api: &dyn ComputeApi, zone: &str, name: &str) -> Result<bool> {
    found(api.get_instance(zone, name)).await
}

pub async fn firewall_exists(api: &dyn ComputeApi, name: &str) -> Result<bool> {
    found(api.get_firewall(name)).await
}
