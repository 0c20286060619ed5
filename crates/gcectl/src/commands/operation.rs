//! Operation command implementations

use colored::Colorize;
use gcectl_core::{OperationHandle, wait_for_operation};

use super::progress::format_state;
use super::{CommandContext, print_or};
use crate::cli::OperationCommands;
use crate::error::Result as CliResult;

pub async fn handle_operation_command(
    cmd: &OperationCommands,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    match cmd {
        OperationCommands::Wait { id, global } => {
            let session = ctx.session()?;
            let handle = if *global {
                OperationHandle::global(id)
            } else {
                OperationHandle::zonal(id, &session.zone)
            };

            let (options, progress) = ctx.wait_options(&session);
            let status = wait_for_operation(&session.client, &handle, &options).await?;
            progress.finish();

            let state = status.state.to_string();
            let data = serde_json::json!({
                "operation": handle.to_string(),
                "status": state,
            });
            print_or(&data, ctx.output, || {
                println!("Operation {}: {}", id.bold(), format_state(&state));
            })
        }
    }
}
