//! Builder for instance insert requests

use super::types::{
    AccessConfig, AttachedDisk, InitializeParams, Instance, Metadata, MetadataItem,
    NetworkInterface, Tags,
};
use crate::error::{CoreError, Result};

pub const DEFAULT_MACHINE_TYPE: &str = "e2-micro";
pub const DEFAULT_NETWORK: &str = "global/networks/default";
pub const STARTUP_SCRIPT_KEY: &str = "startup-script";

/// What the boot disk is initialized from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootSource {
    Image(String),
    Snapshot(String),
}

/// Description of an instance to create
///
/// ```rust
/// use gcectl_core::compute::{BootSource, InstanceSpec};
///
/// let spec = InstanceSpec::new("web-1", BootSource::Image("projects/debian-cloud/global/images/family/debian-12".into()))
///     .tag("web")
///     .startup_script("#!/bin/bash\necho hi");
/// let body = spec.to_instance("us-west1-b").unwrap();
/// assert_eq!(body.machine_type.as_deref(), Some("zones/us-west1-b/machineTypes/e2-micro"));
/// ```
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub name: String,
    pub machine_type: String,
    pub boot_source: BootSource,
    pub tags: Vec<String>,
    pub metadata: Vec<MetadataItem>,
    pub network: String,
    pub external_ip: bool,
}

impl InstanceSpec {
    pub fn new(name: impl Into<String>, boot_source: BootSource) -> Self {
        Self {
            name: name.into(),
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            boot_source,
            tags: Vec::new(),
            metadata: Vec::new(),
            network: DEFAULT_NETWORK.to_string(),
            external_ip: true,
        }
    }

    pub fn machine_type(mut self, machine_type: impl Into<String>) -> Self {
        self.machine_type = machine_type.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
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

    /// Add a metadata item, replacing any earlier item with the same key
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.metadata.retain(|item| item.key != key);
        self.metadata.push(MetadataItem {
            key,
            value: value.into(),
        });
        self
    }

    pub fn startup_script(self, script: impl Into<String>) -> Self {
        self.metadata(STARTUP_SCRIPT_KEY, script)
    }

    pub fn external_ip(mut self, enabled: bool) -> Self {
        self.external_ip = enabled;
        self
    }

    /// Validate and render the insert body for `zone`
    pub fn to_instance(&self, zone: &str) -> Result<Instance> {
        validate_resource_name(&self.name)?;
        for item in &self.metadata {
            validate_metadata_key(&item.key)?;
        }

        let initialize_params = match &self.boot_source {
            BootSource::Image(link) => InitializeParams {
                source_image: Some(link.clone()),
                source_snapshot: None,
            },
            BootSource::Snapshot(link) => InitializeParams {
                source_image: None,
                source_snapshot: Some(link.clone()),
            },
        };

        let access_configs = if self.external_ip {
            vec![AccessConfig {
                kind: Some("ONE_TO_ONE_NAT".to_string()),
                name: Some("External NAT".to_string()),
                nat_ip: None,
            }]
        } else {
            Vec::new()
        };

        Ok(Instance {
            name: self.name.clone(),
            machine_type: Some(format!("zones/{}/machineTypes/{}", zone, self.machine_type)),
            tags: (!self.tags.is_empty()).then(|| Tags {
                items: self.tags.clone(),
            }),
            disks: vec![AttachedDisk {
                boot: true,
                auto_delete: Some(true),
                initialize_params: Some(initialize_params),
                ..Default::default()
            }],
            network_interfaces: vec![NetworkInterface {
                network: Some(self.network.clone()),
                access_configs,
            }],
            metadata: (!self.metadata.is_empty()).then(|| Metadata {
                items: self.metadata.clone(),
            }),
            ..Default::default()
        })
    }
}

/// Resource names: 1-63 chars, lowercase letter first, then `[-a-z0-9]`, no trailing dash
pub fn validate_resource_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name.starts_with(|c: char| c.is_ascii_lowercase())
        && !name.ends_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CoreError::Configuration(format!(
            "invalid resource name '{}': must be 1-63 lowercase letters, digits or dashes, \
             start with a letter and not end with a dash",
            name
        )))
    }
}

/// Metadata keys: 1-128 chars of `[-_a-zA-Z0-9]`
pub fn validate_metadata_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CoreError::Configuration(format!(
            "invalid metadata key '{}'",
            key
        )))
    }
}
