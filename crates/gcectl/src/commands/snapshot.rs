//! Snapshot command implementations

use colored::Colorize;
use gcectl_core::ComputeApi;
use gcectl_core::workflows::{
    SnapshotOutcome, default_snapshot_name, ensure_snapshot, snapshot_exists,
    wait_for_snapshot_ready,
};

use super::progress::format_state;
use super::{CommandContext, print_or};
use crate::cli::SnapshotCommands;
use crate::error::Result as CliResult;

pub async fn handle_snapshot_command(
    cmd: &SnapshotCommands,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let session = ctx.session()?;
    let api: &dyn ComputeApi = &session.client;

    match cmd {
        SnapshotCommands::Create {
            source_instance,
            name,
        } => {
            let name = name
                .clone()
                .unwrap_or_else(|| default_snapshot_name(source_instance));

            let (options, progress) = ctx.wait_options(&session);
            let outcome =
                ensure_snapshot(api, &session.zone, source_instance, &name, &options).await?;
            progress.finish();

            let data = serde_json::json!({
                "name": outcome.snapshot.name,
                "disk": outcome.disk,
                "created": outcome.created,
                "status": outcome.snapshot.status.map(|s| s.to_string()),
            });
            print_or(&data, ctx.output, || print_outcome(&outcome))
        }
        SnapshotCommands::Exists { name } => {
            let exists = snapshot_exists(api, name).await?;
            let data = serde_json::json!({ "name": name, "exists": exists });
            print_or(&data, ctx.output, || println!("{}", exists))
        }
        SnapshotCommands::WaitReady { name } => {
            let (options, progress) = ctx.wait_options(&session);
            let snapshot = wait_for_snapshot_ready(api, name, &options).await?;
            progress.finish();

            let status = snapshot.status.map(|s| s.to_string()).unwrap_or_default();
            print_or(&snapshot, ctx.output, || {
                println!("Snapshot {}: {}", name.bold(), format_state(&status));
            })
        }
    }
}

/// One-line summary of a create-or-reuse
pub(crate) fn print_outcome(outcome: &SnapshotOutcome) {
    let verb = if outcome.created { "Created" } else { "Reused" };
    let source = outcome
        .disk
        .as_deref()
        .map(|disk| format!(" of disk {}", disk))
        .unwrap_or_default();
    println!(
        "{} {} snapshot {}{}",
        "\u{2713}".green(),
        verb,
        outcome.snapshot.name.bold(),
        source
    );
}
