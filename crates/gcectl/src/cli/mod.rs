//! CLI structure and command definitions
//!
//! Resource commands (`instance`, `firewall`, `snapshot`, `operation`) map
//! one-to-one onto control-plane calls plus a wait. `clone` and `controller`
//! run the multi-step workflows from `gcectl_core::workflows`.

use clap::{Parser, Subcommand};

pub mod compute;

pub use compute::*;

/// Compute Engine lab CLI
#[derive(Parser, Debug)]
#[command(name = "gcectl")]
#[command(
    version,
    about = "Compute Engine lab CLI: snapshots, clones, firewall rules, and controller VMs"
)]
#[command(long_about = "
Compute Engine lab CLI: snapshots, clones, firewall rules, and controller VMs

Every mutating call returns a long-running operation; gcectl waits for it to
finish before moving on and reports provider errors as they were returned.

EXAMPLES:
    # Set up a profile
    gcectl profile set lab --project my-project --default-zone us-west1-b \\
        --access-token '${GCECTL_ACCESS_TOKEN}'

    # Open port 5000 to instances tagged flask-server
    gcectl firewall ensure allow-flask-5000 --target-tag flask-server --port 5000

    # Snapshot web-1 and create three clones, writing TIMING.md
    gcectl clone web-1 --count 3

    # Launch a controller VM that bootstraps a second machine
    gcectl controller launch controller --startup-script controller.sh \\
        --payload service-credentials=creds.json --payload vm2-startup=vm2.sh

    # Get JSON output for scripting
    gcectl instance list -o json

For more help on a specific command, run:
    gcectl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "GCECTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "GCECTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Zone for zonal resources (defaults to the profile's zone)
    #[arg(long, short = 'z', global = true, env = "GCECTL_ZONE")]
    pub zone: Option<String>,

    /// Disable retry of transient provider errors
    #[arg(long, global = true)]
    pub no_retry: bool,

    /// Override retry attempts
    #[arg(long, global = true)]
    pub retry_attempts: Option<u32>,

    /// Seconds between operation status polls
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    /// Give up waiting for an operation after this many seconds
    #[arg(long, global = true)]
    pub wait_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Automatically choose format based on command and context
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

impl OutputFormat {
    /// Formats meant for people rather than scripts
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Auto | Self::Table)
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Instance operations
    #[command(subcommand, visible_alias = "vm")]
    Instance(InstanceCommands),

    /// Firewall rule operations
    #[command(subcommand, visible_alias = "fw")]
    Firewall(FirewallCommands),

    /// Boot-disk snapshot operations
    #[command(subcommand, visible_alias = "snap")]
    Snapshot(SnapshotCommands),

    /// Long-running operation tracking
    #[command(subcommand, visible_alias = "op")]
    Operation(OperationCommands),

    /// Snapshot an instance and create clones from it
    #[command(after_help = "EXAMPLES:
    # Three clones of web-1, sequentially, timing written to TIMING.md
    gcectl clone web-1

    # Five clones, two at a time, reusing an existing snapshot
    gcectl clone web-1 --count 5 --concurrency 2 --snapshot-name base-web

    # Resume after clone-2-web failed
    gcectl clone web-1 --count 5 --start-index 2

    # Tag clones and give them a startup script
    gcectl clone web-1 --tag flask-server --startup-script startup.sh
")]
    Clone(CloneArgs),

    /// Controller VM launch and metadata bootstrap
    #[command(subcommand, visible_alias = "ctl")]
    Controller(ControllerCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    #[command(after_help = "EXAMPLES:
    # Bash (add to ~/.bashrc)
    eval \"$(gcectl completions bash)\"

    # Zsh (add to ~/.zshrc)
    eval \"$(gcectl completions zsh)\"

    # Fish
    gcectl completions fish > ~/.config/fish/completions/gcectl.fish
")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    #[command(after_help = "EXAMPLES:
    # Token read from the environment at load time
    gcectl profile set lab --project my-project \\
        --access-token '${GCECTL_ACCESS_TOKEN}'

    # Different default zone, made the default profile
    gcectl profile set eu --project my-project --default-zone europe-west1-b --default

    # Token stored in the OS keyring
    gcectl profile set lab --project my-project --access-token ya29... --use-keyring
")]
    Set {
        /// Profile name
        name: String,

        /// Project every call is scoped to
        #[arg(long)]
        project: String,

        /// Zone used when a command does not pass --zone
        #[arg(long)]
        default_zone: Option<String>,

        /// Bearer token, or a ${VAR} reference resolved when the config loads
        #[arg(long)]
        access_token: Option<String>,

        /// Override the Compute Engine API base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Store the access token in the OS keyring
        #[cfg(feature = "secure-storage")]
        #[arg(long, requires = "access_token")]
        use_keyring: bool,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to make default
        name: String,
    },
}
