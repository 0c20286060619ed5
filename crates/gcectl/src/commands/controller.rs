//! Controller command implementations

use gcectl_core::ComputeApi;
use gcectl_core::workflows::{
    BootstrapPlan, ControllerPlan, MetadataPayload, bootstrap_from_metadata, launch_controller,
};

use super::CommandContext;
use super::instance::print_provisioned;
use crate::cli::ControllerCommands;
use crate::error::Result as CliResult;

pub async fn handle_controller_command(
    cmd: &ControllerCommands,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let session = ctx.session()?;
    let api: &dyn ComputeApi = &session.client;

    let provisioned = match cmd {
        ControllerCommands::Launch {
            name,
            startup_script,
            payloads,
            image,
            machine_type,
            tags,
        } => {
            let mut plan =
                ControllerPlan::new(name, &session.zone, startup_script).tags(tags.iter().cloned());
            if let Some(image) = image {
                plan = plan.source_image(image);
            }
            if let Some(machine_type) = machine_type {
                plan = plan.machine_type(machine_type);
            }
            for entry in payloads {
                plan = plan.payload(MetadataPayload::parse(entry)?);
            }

            let (options, progress) = ctx.wait_options(&session);
            let provisioned = launch_controller(api, &plan, &options).await?;
            progress.finish();
            provisioned
        }
        ControllerCommands::Bootstrap {
            name,
            script,
            image_project,
            image_family,
            machine_type,
            tags,
        } => {
            let mut plan = BootstrapPlan::new(name, &session.zone, script)
                .image_family(image_project, image_family)
                .tags(tags.iter().cloned());
            if let Some(machine_type) = machine_type {
                plan = plan.machine_type(machine_type);
            }

            let (options, progress) = ctx.wait_options(&session);
            let provisioned = bootstrap_from_metadata(api, &plan, &options).await?;
            progress.finish();
            provisioned
        }
    };

    print_provisioned(&provisioned, ctx.output)
}
