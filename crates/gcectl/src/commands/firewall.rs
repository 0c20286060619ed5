//! Firewall command implementations

use colored::Colorize;
use gcectl_core::ComputeApi;
use gcectl_core::workflows::{FirewallOutcome, FirewallRule, ensure_firewall_rule, firewall_exists};

use super::{CommandContext, print_or};
use crate::cli::FirewallCommands;
use crate::error::Result as CliResult;

pub async fn handle_firewall_command(
    cmd: &FirewallCommands,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let session = ctx.session()?;
    let api: &dyn ComputeApi = &session.client;

    match cmd {
        FirewallCommands::Ensure {
            name,
            target_tag,
            ports,
            source_ranges,
            description,
        } => {
            let mut rule =
                FirewallRule::allow_tcp(name, target_tag, ports).source_ranges(source_ranges.clone());
            if let Some(description) = description {
                rule = rule.description(description);
            }

            let (options, progress) = ctx.wait_options(&session);
            let outcome = ensure_firewall_rule(api, &rule, &options).await?;
            progress.finish();

            let created = outcome == FirewallOutcome::Created;
            let data = serde_json::json!({
                "name": rule.name,
                "created": created,
                "target_tag": rule.target_tag,
                "ports": rule.ports,
                "source_ranges": rule.source_ranges,
            });
            print_or(&data, ctx.output, || {
                if created {
                    println!("{} Created firewall rule {}", "\u{2713}".green(), name.bold());
                } else {
                    println!("Firewall rule {} already exists", name.bold());
                }
            })
        }
        FirewallCommands::Exists { name } => {
            let exists = firewall_exists(api, name).await?;
            let data = serde_json::json!({ "name": name, "exists": exists });
            print_or(&data, ctx.output, || println!("{}", exists))
        }
    }
}
