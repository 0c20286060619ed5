//! Compute resource and workflow commands

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Instance commands
#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// List instances in the zone
    #[command(visible_alias = "ls")]
    List,

    /// Get instance details
    Get {
        /// Instance name
        name: String,
    },

    /// Check whether an instance exists
    Exists {
        /// Instance name
        name: String,
    },

    /// Create an instance from an image family and wait for it
    #[command(after_help = "EXAMPLES:
    # Debian 12 micro instance tagged for the Flask firewall rule
    gcectl instance create web-1 --tag flask-server --startup-script startup.sh

    # Attach extra metadata read from files
    gcectl instance create web-2 --metadata app-config=config.json
")]
    Create {
        /// Instance name
        name: String,

        /// Project that owns the image family
        #[arg(long, default_value = gcectl_core::workflows::controller::DEFAULT_IMAGE_PROJECT)]
        image_project: String,

        /// Image family to boot from
        #[arg(long, default_value = gcectl_core::workflows::controller::DEFAULT_IMAGE_FAMILY)]
        image_family: String,

        /// Machine type
        #[arg(long)]
        machine_type: Option<String>,

        /// Network tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Startup script file
        #[arg(long)]
        startup_script: Option<PathBuf>,

        /// Extra metadata entry as KEY=PATH (repeatable)
        #[arg(long = "metadata", value_name = "KEY=PATH")]
        metadata: Vec<String>,

        /// Do not attach an external IP
        #[arg(long)]
        no_external_ip: bool,
    },
}

/// Firewall commands
#[derive(Subcommand, Debug)]
pub enum FirewallCommands {
    /// Create an ingress rule unless one with the same name exists
    #[command(after_help = "EXAMPLES:
    # Allow TCP 5000 from anywhere to instances tagged flask-server
    gcectl firewall ensure allow-flask-5000 --target-tag flask-server --port 5000

    # Restrict sources
    gcectl firewall ensure allow-ssh --target-tag ssh --port 22 --source-range 10.0.0.0/8
")]
    Ensure {
        /// Rule name
        name: String,

        /// Instances carrying this network tag are targeted
        #[arg(long)]
        target_tag: String,

        /// TCP port to allow (repeatable)
        #[arg(long = "port", required = true)]
        ports: Vec<u16>,

        /// Source CIDR range (repeatable, default 0.0.0.0/0)
        #[arg(long = "source-range")]
        source_ranges: Vec<String>,

        /// Rule description
        #[arg(long)]
        description: Option<String>,
    },

    /// Check whether a rule exists
    Exists {
        /// Rule name
        name: String,
    },
}

/// Snapshot commands
#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// Snapshot an instance's boot disk, reusing an existing snapshot
    Create {
        /// Instance whose boot disk is snapshotted
        source_instance: String,

        /// Snapshot name (default base-snapshot-<instance>)
        #[arg(long)]
        name: Option<String>,
    },

    /// Check whether a snapshot exists
    Exists {
        /// Snapshot name
        name: String,
    },

    /// Wait until a snapshot is READY
    WaitReady {
        /// Snapshot name
        name: String,
    },
}

/// Operation commands
#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Wait for an operation to reach DONE
    #[command(after_help = "EXAMPLES:
    # Zonal operation in the profile's zone
    gcectl operation wait operation-1700000000000-abc

    # Global operation (firewalls, images)
    gcectl operation wait operation-1700000000000-def --global

    # Bounded wait
    gcectl operation wait operation-1700000000000-abc --wait-timeout 300
")]
    Wait {
        /// Operation name
        id: String,

        /// Poll the global operations endpoint instead of the zone's
        #[arg(long)]
        global: bool,
    },
}

/// Arguments for `gcectl clone`
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Instance whose boot disk is cloned
    pub source: String,

    /// Number of clones
    #[arg(
        long,
        default_value_t = gcectl_core::workflows::DEFAULT_CLONE_COUNT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub count: u32,

    /// First clone index to create; earlier indices are left alone
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub start_index: u32,

    /// Snapshot name (default base-snapshot-<source>)
    #[arg(long)]
    pub snapshot_name: Option<String>,

    /// Machine type for the clones
    #[arg(long)]
    pub machine_type: Option<String>,

    /// Network tag applied to every clone (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Startup script file given to every clone
    #[arg(long)]
    pub startup_script: Option<PathBuf>,

    /// Clones in flight at once
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub concurrency: usize,

    /// Where to write the timing table
    #[arg(long, default_value = "TIMING.md")]
    pub report: PathBuf,

    /// Do not write the timing table
    #[arg(long, conflicts_with = "report")]
    pub no_report: bool,
}

/// Controller commands
#[derive(Subcommand, Debug)]
pub enum ControllerCommands {
    /// Launch a VM whose startup script drives further provisioning
    #[command(after_help = "EXAMPLES:
    gcectl controller launch controller --startup-script controller.sh \\
        --payload service-credentials=creds.json \\
        --payload vm2-startup=vm2-startup.sh
")]
    Launch {
        /// Controller instance name
        name: String,

        /// Startup script file
        #[arg(long)]
        startup_script: PathBuf,

        /// Metadata entry as KEY=PATH; the file content becomes the value (repeatable)
        #[arg(long = "payload", value_name = "KEY=PATH")]
        payloads: Vec<String>,

        /// Source image (default the debian-12 family)
        #[arg(long)]
        image: Option<String>,

        /// Machine type
        #[arg(long)]
        machine_type: Option<String>,

        /// Network tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Create a machine from a script file, resolving the image family first
    #[command(after_help = "EXAMPLES:
    # Run on the controller with the script fetched from metadata
    gcectl controller bootstrap vm2 --script /tmp/vm2-startup.sh --tag flask-server
")]
    Bootstrap {
        /// Instance name
        name: String,

        /// Startup script file for the new machine
        #[arg(long)]
        script: PathBuf,

        /// Project that owns the image family
        #[arg(long, default_value = gcectl_core::workflows::controller::DEFAULT_IMAGE_PROJECT)]
        image_project: String,

        /// Image family to boot from
        #[arg(long, default_value = gcectl_core::workflows::controller::DEFAULT_IMAGE_FAMILY)]
        image_family: String,

        /// Machine type
        #[arg(long)]
        machine_type: Option<String>,

        /// Network tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}
