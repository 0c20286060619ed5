//! Controller launch and metadata bootstrap
//!
//! A controller is an instance that provisions another instance from inside
//! the guest. Everything it needs (its own logic, credential material, the
//! second machine's startup script) travels as metadata items attached at
//! creation. The item contents are opaque here.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::compute::spec::DEFAULT_MACHINE_TYPE;
use crate::compute::{BootSource, ComputeApi, InstanceSpec, MetadataItem, STARTUP_SCRIPT_KEY};
use crate::error::{CoreError, Result};
use crate::progress::WaitOptions;

use super::instance::{ProvisionedInstance, create_instance_and_wait, resolve_image_family};

pub const DEFAULT_IMAGE_PROJECT: &str = "debian-cloud";
pub const DEFAULT_IMAGE_FAMILY: &str = "debian-12";

/// A metadata item whose value is read from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPayload {
    pub key: String,
    pub path: PathBuf,
}

impl MetadataPayload {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    /// Parse `key=path`
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.split_once('=') {
            Some((key, path)) if !key.is_empty() && !path.is_empty() => Ok(Self::new(key, path)),
            _ => Err(CoreError::Configuration(format!(
                "invalid payload '{}': expected KEY=PATH",
                spec
            ))),
        }
    }

    pub async fn load(&self) -> Result<MetadataItem> {
        let value = read_required(&self.path, &self.key).await?;
        debug!(key = %self.key, bytes = value.len(), "loaded metadata payload");
        Ok(MetadataItem {
            key: self.key.clone(),
            value,
        })
    }
}

async fn read_required(path: &Path, what: &str) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CoreError::Configuration(
            format!("{} file not found: {}", what, path.display()),
        )),
        Err(e) => Err(CoreError::Io(e)),
    }
}

/// Controller instance definition
#[derive(Debug, Clone)]
pub struct ControllerPlan {
    pub name: String,
    pub zone: String,
    pub source_image: String,
    pub machine_type: String,
    pub tags: Vec<String>,
    /// Path of the controller's own startup script
    pub startup_script: PathBuf,
    pub payloads: Vec<MetadataPayload>,
}

impl ControllerPlan {
    pub fn new(
        name: impl Into<String>,
        zone: impl Into<String>,
        startup_script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            zone: zone.into(),
            source_image: super::instance::image_family_link(
                DEFAULT_IMAGE_PROJECT,
                DEFAULT_IMAGE_FAMILY,
            ),
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            tags: Vec::new(),
            startup_script: startup_script.into(),
            payloads: Vec::new(),
        }
    }

    pub fn source_image(mut self, image: impl Into<String>) -> Self {
        self.source_image = image.into();
        self
    }

    pub fn machine_type(mut self, machine_type: impl Into<String>) -> Self {
        self.machine_type = machine_type.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn payload(mut self, payload: MetadataPayload) -> Self {
        self.payloads.push(payload);
        self
    }

    /// Read every file and assemble the instance; no API call is made
    pub async fn to_spec(&self) -> Result<InstanceSpec> {
        let script = read_required(&self.startup_script, STARTUP_SCRIPT_KEY).await?;

        let mut spec = InstanceSpec::new(&self.name, BootSource::Image(self.source_image.clone()))
            .machine_type(self.machine_type.clone())
            .tags(self.tags.iter().cloned())
            .startup_script(script);

        for payload in &self.payloads {
            if payload.key == STARTUP_SCRIPT_KEY {
                return Err(CoreError::Configuration(format!(
                    "payload key '{}' is reserved for the controller's own script",
                    STARTUP_SCRIPT_KEY
                )));
            }
            let item = payload.load().await?;
            spec = spec.metadata(item.key, item.value);
        }
        Ok(spec)
    }
}

/// Create the controller with its startup script and payload items attached
///
/// All payload files are read before anything is submitted, so a missing
/// file fails the launch without creating a half-configured instance.
pub async fn launch_controller(
    api: &dyn ComputeApi,
    plan: &ControllerPlan,
    options: &WaitOptions,
) -> Result<ProvisionedInstance> {
    let spec = plan.to_spec().await?;
    info!(
        "Launching controller {} with {} payload item(s)",
        plan.name,
        plan.payloads.len()
    );
    create_instance_and_wait(api, &plan.zone, &spec, options).await
}

/// Second machine created from inside the controller
#[derive(Debug, Clone)]
pub struct BootstrapPlan {
    pub name: String,
    pub zone: String,
    pub image_project: String,
    pub image_family: String,
    pub machine_type: String,
    pub tags: Vec<String>,
    /// Startup script the guest fetched from its metadata
    pub script_path: PathBuf,
}

impl BootstrapPlan {
    pub fn new(
        name: impl Into<String>,
        zone: impl Into<String>,
        script_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            zone: zone.into(),
            image_project: DEFAULT_IMAGE_PROJECT.to_string(),
            image_family: DEFAULT_IMAGE_FAMILY.to_string(),
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            tags: Vec::new(),
            script_path: script_path.into(),
        }
    }

    pub fn image_family(mut self, project: impl Into<String>, family: impl Into<String>) -> Self {
        self.image_project = project.into();
        self.image_family = family.into();
        self
    }

    pub fn machine_type(mut self, machine_type: impl Into<String>) -> Self {
        self.machine_type = machine_type.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Create the second machine from an image family using the fetched script
pub async fn bootstrap_from_metadata(
    api: &dyn ComputeApi,
    plan: &BootstrapPlan,
    options: &WaitOptions,
) -> Result<ProvisionedInstance> {
    let script = read_required(&plan.script_path, "second-stage startup script").await?;
    let image = resolve_image_family(api, &plan.image_project, &plan.image_family).await?;

    let spec = InstanceSpec::new(&plan.name, BootSource::Image(image.self_link))
        .machine_type(plan.machine_type.clone())
        .tags(plan.tags.iter().cloned())
        .startup_script(script);

    create_instance_and_wait(api, &plan.zone, &spec, options).await
}
