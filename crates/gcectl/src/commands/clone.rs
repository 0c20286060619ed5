//! `gcectl clone`: snapshot a source instance and create clones from it

use colored::Colorize;
use gcectl_core::workflows::{ClonePlan, CloneRun, run_clone_pipeline, write_timing_report};
use tracing::info;

use super::instance::read_script;
use super::snapshot::print_outcome;
use super::{CommandContext, print_or};
use crate::cli::CloneArgs;
use crate::error::{GceCtlError, Result as CliResult};

/// Translate flags into a plan for `zone`
pub async fn build_plan(args: &CloneArgs, zone: &str) -> CliResult<ClonePlan> {
    let mut plan = ClonePlan::new(&args.source, zone)
        .count(args.count)
        .start_index(args.start_index)
        .concurrency(args.concurrency)
        .tags(args.tags.iter().cloned());
    if let Some(name) = &args.snapshot_name {
        plan = plan.snapshot_name(name);
    }
    if let Some(machine_type) = &args.machine_type {
        plan = plan.machine_type(machine_type);
    }
    if let Some(path) = &args.startup_script {
        plan = plan.startup_script(read_script(path).await?);
    }
    Ok(plan)
}

pub async fn handle_clone_command(args: &CloneArgs, ctx: &CommandContext<'_>) -> CliResult<()> {
    let session = ctx.session()?;
    let plan = build_plan(args, &session.zone).await?;

    let (options, progress) = ctx.wait_options(&session);
    let run = run_clone_pipeline(&session.client, &plan, &options).await?;
    progress.finish();

    let written = if args.no_report {
        false
    } else {
        write_timing_report(&plan, &run, &args.report).map_err(|e| GceCtlError::FileError {
            path: args.report.display().to_string(),
            message: e.to_string(),
        })?
    };
    let report_path = written.then(|| {
        info!("Timing report written to {}", args.report.display());
        args.report.display().to_string()
    });

    let data = serde_json::json!({
        "snapshot": {
            "name": run.snapshot.snapshot.name,
            "disk": run.snapshot.disk,
            "created": run.snapshot.created,
        },
        "clones": run.report.rows(),
        "skipped": run.skipped,
        "total_seconds": run.report.total().as_secs_f64(),
        "report": report_path,
    });
    print_or(&data, ctx.output, || print_run(&run, report_path.as_deref()))
}

fn print_run(run: &CloneRun, report_path: Option<&str>) {
    print_outcome(&run.snapshot);
    for name in &run.skipped {
        println!("{} {} already exists, skipped", "-".yellow(), name);
    }
    if !run.report.is_empty() {
        println!();
        print!("{}", run.report);
        println!();
        println!(
            "Created {} clone(s) in {:.2}s",
            run.report.len(),
            run.report.total().as_secs_f64()
        );
    }
    if let Some(path) = report_path {
        println!("Timing written to {}", path);
    }
}
