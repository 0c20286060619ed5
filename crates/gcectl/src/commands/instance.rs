//! Instance command implementations

use colored::Colorize;
use gcectl_core::compute::types::last_segment;
use gcectl_core::compute::{BootSource, Instance, STARTUP_SCRIPT_KEY};
use gcectl_core::workflows::{
    MetadataPayload, ProvisionedInstance, create_instance_and_wait, instance_exists,
    resolve_image_family,
};
use gcectl_core::{ComputeApi, InstanceSpec};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use super::{CommandContext, print_or};
use crate::cli::{InstanceCommands, OutputFormat};
use crate::error::Result as CliResult;

/// The columns shown for an instance
#[derive(Debug, Serialize)]
pub struct InstanceSummary {
    pub name: String,
    pub status: String,
    pub machine_type: String,
    pub external_ip: Option<String>,
    pub tags: Vec<String>,
}

impl From<&Instance> for InstanceSummary {
    fn from(instance: &Instance) -> Self {
        Self {
            name: instance.name.clone(),
            status: instance.status.clone().unwrap_or_default(),
            machine_type: instance
                .machine_type
                .as_deref()
                .map(last_segment)
                .unwrap_or_default()
                .to_string(),
            external_ip: instance.external_ip().map(str::to_string),
            tags: instance.tag_items().to_vec(),
        }
    }
}

pub async fn handle_instance_command(
    cmd: &InstanceCommands,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let session = ctx.session()?;
    let api: &dyn ComputeApi = &session.client;

    match cmd {
        InstanceCommands::List => {
            let instances = api.list_instances(&session.zone).await?;
            let rows: Vec<InstanceSummary> = instances.iter().map(InstanceSummary::from).collect();
            print_or(&rows, ctx.output, || {
                if rows.is_empty() {
                    println!("No instances in {}", session.zone);
                }
                for row in &rows {
                    println!(
                        "{:<30} {:<12} {}",
                        row.name.bold(),
                        row.status,
                        row.external_ip.as_deref().unwrap_or("-")
                    );
                }
            })
        }
        InstanceCommands::Get { name } => {
            let instance = api.get_instance(&session.zone, name).await?;
            let summary = InstanceSummary::from(&instance);
            print_or(&instance, ctx.output, || print_summary(&summary))
        }
        InstanceCommands::Exists { name } => {
            let exists = instance_exists(api, &session.zone, name).await?;
            let data = serde_json::json!({ "name": name, "exists": exists });
            print_or(&data, ctx.output, || println!("{}", exists))
        }
        InstanceCommands::Create {
            name,
            image_project,
            image_family,
            machine_type,
            tags,
            startup_script,
            metadata,
            no_external_ip,
        } => {
            let image = resolve_image_family(api, image_project, image_family).await?;
            let mut spec = InstanceSpec::new(name, BootSource::Image(image.self_link))
                .tags(tags.iter().cloned())
                .external_ip(!no_external_ip);
            if let Some(machine_type) = machine_type {
                spec = spec.machine_type(machine_type);
            }
            if let Some(path) = startup_script {
                spec = spec.startup_script(read_script(path).await?);
            }
            for entry in metadata {
                let item = MetadataPayload::parse(entry)?.load().await?;
                spec = spec.metadata(item.key, item.value);
            }

            let (options, progress) = ctx.wait_options(&session);
            let provisioned = create_instance_and_wait(api, &session.zone, &spec, &options).await?;
            progress.finish();

            print_provisioned(&provisioned, ctx.output)
        }
    }
}

/// Read a startup script, reporting a missing file as bad input
pub(crate) async fn read_script(path: &Path) -> CliResult<String> {
    debug!("Reading startup script {}", path.display());
    let item = MetadataPayload::new(STARTUP_SCRIPT_KEY, path).load().await?;
    Ok(item.value)
}

/// Report a freshly created instance with its creation time
pub(crate) fn print_provisioned(
    provisioned: &ProvisionedInstance,
    output: OutputFormat,
) -> CliResult<()> {
    let summary = InstanceSummary::from(&provisioned.instance);
    let data = serde_json::json!({
        "instance": summary,
        "seconds": provisioned.duration.as_secs_f64(),
    });
    print_or(&data, output, || {
        println!(
            "{} Created {} in {:.2}s",
            "\u{2713}".green(),
            summary.name.bold(),
            provisioned.duration.as_secs_f64()
        );
        if let Some(ip) = &summary.external_ip {
            println!("External IP: {}", ip);
        }
    })
}

fn print_summary(summary: &InstanceSummary) {
    println!("Name:         {}", summary.name.bold());
    println!("Status:       {}", summary.status);
    println!("Machine type: {}", summary.machine_type);
    println!(
        "External IP:  {}",
        summary.external_ip.as_deref().unwrap_or("-")
    );
    if !summary.tags.is_empty() {
        println!("Tags:         {}", summary.tags.join(", "));
    }
}
