//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;
use crate::domain::config::TargetOverrides;

/// Idempotent single-host deploys of a Python service under systemd
#[derive(Parser)]
#[command(
    name = "convoy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Enable debug logging on stderr (overridden by CONVOY_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file [default: $CONVOY_CONFIG, ./convoy.yaml, ~/.convoy/config.yaml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Deploy target overrides; each falls back to the configuration file.
#[derive(Args, Debug, Default)]
pub struct TargetArgs {
    /// Remote host name or address
    #[arg(long, global = true, env = "CONVOY_HOST")]
    pub host: Option<String>,

    /// Login user on the remote host
    #[arg(long, global = true, env = "CONVOY_USER")]
    pub user: Option<String>,

    /// Absolute application directory on the remote host
    #[arg(long, global = true, env = "CONVOY_BASE_DIR", value_name = "DIR")]
    pub base_dir: Option<String>,

    /// ssh port
    #[arg(long, global = true, env = "CONVOY_PORT")]
    pub port: Option<u16>,

    /// Private key passed to ssh and scp
    #[arg(long, global = true, env = "CONVOY_IDENTITY", value_name = "FILE")]
    pub identity: Option<PathBuf>,
}

impl From<TargetArgs> for TargetOverrides {
    fn from(args: TargetArgs) -> Self {
        Self {
            host: args.host,
            user: args.user,
            base_dir: args.base_dir,
            port: args.port,
            identity_file: args.identity,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Bundle, provision and restart the service on the target host
    Deploy,

    /// Show what exists on the target host and the service status
    Status,

    /// Show which provisioning steps a deploy would run
    Plan,

    /// Build the bundle archive locally
    Bundle(commands::bundle::BundleArgs),

    /// Print the systemd unit that re-asserts the service at boot
    BootHook,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,

    #[command(hide = true, name = "_boot-assert")]
    BootAssert(commands::boot::BootAssertArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose,
            config,
            target,
            command,
        } = self;
        crate::infra::logging::init(verbose, no_color);

        let app = AppContext::new(&AppFlags {
            json,
            quiet,
            no_color,
            config,
            overrides: target.into(),
        });

        match command {
            Command::Deploy => commands::deploy::run(&app).await,
            Command::Status => commands::status::run(&app).await,
            Command::Plan => commands::plan::run(&app).await,
            Command::Bundle(args) => commands::bundle::run(&app, &args),
            Command::BootHook => commands::boot::hook(&app),
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
            Command::BootAssert(args) => commands::boot::assert(&app, &args).await,
        }
    }
}
