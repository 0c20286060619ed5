//! Instance provisioning

use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::compute::{ComputeApi, Image, Instance, InstanceSpec};
use crate::error::Result;
use crate::progress::{WaitOptions, wait_for_operation};

/// An instance after its insert operation finished
#[derive(Debug, Clone)]
pub struct ProvisionedInstance {
    pub instance: Instance,
    /// Submission to `DONE`
    pub duration: Duration,
}

/// Partial URL of an image family, accepted anywhere a source image is
pub fn image_family_link(image_project: &str, family: &str) -> String {
    format!("projects/{}/global/images/family/{}", image_project, family)
}

/// Resolve the current image of a family to its self link
pub async fn resolve_image_family(
    api: &dyn ComputeApi,
    image_project: &str,
    family: &str,
) -> Result<Image> {
    let image = api.get_image_from_family(image_project, family).await?;
    info!(
        "Resolved image family {}/{} to {}",
        image_project, family, image.name
    );
    Ok(image)
}

/// Insert an instance, wait for the operation, and read the instance back
pub async fn create_instance_and_wait(
    api: &dyn ComputeApi,
    zone: &str,
    spec: &InstanceSpec,
    options: &WaitOptions,
) -> Result<ProvisionedInstance> {
    let body = spec.to_instance(zone)?;

    info!("Creating instance {} in {}", spec.name, zone);
    let start = Instant::now();
    let operation = api.insert_instance(zone, &body).await?;
    wait_for_operation(api, &operation.handle(), options).await?;
    let duration = start.elapsed();

    let instance = api.get_instance(zone, &spec.name).await?;
    Ok(ProvisionedInstance { instance, duration })
}
