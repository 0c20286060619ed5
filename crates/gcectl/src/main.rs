use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use gcectl_core::Config;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::CommandContext;
use connection::ConnectionManager;
use error::GceCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let loaded = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        Config::load_from_path(&path).map(|config| (config, Some(path)))
    } else {
        debug!("Loading config from default location");
        Config::load().map(|config| (config, None))
    };
    let (config, config_path) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => exit_with(GceCtlError::from(e)),
    };
    let mut conn_mgr = ConnectionManager::with_config_path(config, config_path);

    // Ctrl-C stops any wait in progress; submitted operations keep running
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling wait");
            on_signal.cancel();
        }
    });

    if let Err(e) = execute_command(&cli, &mut conn_mgr, cancel).await {
        exit_with(e);
    }

    Ok(())
}

fn exit_with(err: GceCtlError) -> ! {
    error!("{}", err);
    err.print_diagnostic();
    std::process::exit(err.exit_code());
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "gcectl=warn,gcectl_core=warn",
            1 => "gcectl=info,gcectl_core=info",
            2 => "gcectl=debug,gcectl_core=debug",
            _ => "gcectl=trace,gcectl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(
    cli: &Cli,
    conn_mgr: &mut ConnectionManager,
    cancel: CancellationToken,
) -> Result<(), GceCtlError> {
    // Log command execution with sanitized parameters
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match cli.output {
                cli::OutputFormat::Json | cli::OutputFormat::Yaml => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(&output_data, cli.output.into())?;
                }
                _ => {
                    println!("gcectl {}", env!("CARGO_PKG_VERSION"));
                }
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }
        Commands::Profile(profile_cmd) => {
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }
        Commands::Instance(cmd) => {
            let ctx = CommandContext::new(cli, conn_mgr, cancel);
            commands::instance::handle_instance_command(cmd, &ctx).await
        }
        Commands::Firewall(cmd) => {
            let ctx = CommandContext::new(cli, conn_mgr, cancel);
            commands::firewall::handle_firewall_command(cmd, &ctx).await
        }
        Commands::Snapshot(cmd) => {
            let ctx = CommandContext::new(cli, conn_mgr, cancel);
            commands::snapshot::handle_snapshot_command(cmd, &ctx).await
        }
        Commands::Operation(cmd) => {
            let ctx = CommandContext::new(cli, conn_mgr, cancel);
            commands::operation::handle_operation_command(cmd, &ctx).await
        }
        Commands::Clone(args) => {
            let ctx = CommandContext::new(cli, conn_mgr, cancel);
            commands::clone::handle_clone_command(args, &ctx).await
        }
        Commands::Controller(cmd) => {
            let ctx = CommandContext::new(cli, conn_mgr, cancel);
            commands::controller::handle_controller_command(cmd, &ctx).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!(
            "Command completed successfully in {:.3}s",
            duration.as_secs_f64()
        ),
        Err(e) => debug!("Command failed after {:.3}s: {}", duration.as_secs_f64(), e),
    }

    result
}

fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Instance(cmd) => {
            use cli::InstanceCommands::*;
            match cmd {
                List => "instance list".to_string(),
                Get { name } => format!("instance get {}", name),
                Exists { name } => format!("instance exists {}", name),
                Create { name, .. } => format!("instance create {}", name),
            }
        }
        Commands::Firewall(cmd) => match cmd {
            cli::FirewallCommands::Ensure { name, ports, .. } => {
                format!("firewall ensure {} {:?}", name, ports)
            }
            cli::FirewallCommands::Exists { name } => format!("firewall exists {}", name),
        },
        Commands::Snapshot(cmd) => match cmd {
            cli::SnapshotCommands::Create {
                source_instance, ..
            } => format!("snapshot create {}", source_instance),
            cli::SnapshotCommands::Exists { name } => format!("snapshot exists {}", name),
            cli::SnapshotCommands::WaitReady { name } => format!("snapshot wait-ready {}", name),
        },
        Commands::Operation(cli::OperationCommands::Wait { id, global }) => {
            format!("operation wait {}{}", id, if *global { " --global" } else { "" })
        }
        Commands::Clone(args) => format!(
            "clone {} --count {} --start-index {}",
            args.source, args.count, args.start_index
        ),
        Commands::Controller(cmd) => match cmd {
            cli::ControllerCommands::Launch { name, payloads, .. } => format!(
                "controller launch {} [{} payload(s)]",
                name,
                payloads.len()
            ),
            cli::ControllerCommands::Bootstrap { name, .. } => {
                format!("controller bootstrap {}", name)
            }
        },
    }
}
