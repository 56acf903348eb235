//! a2dp-installer: deploy and register the A2DP Bluetooth agent.
//!
//! # Usage
//!
//! ```text
//! a2dp-installer [--config <file>] [--prefix <dir>] [-v] install
//! a2dp-installer uninstall
//! a2dp-installer install-bin | uninstall-bin
//! a2dp-installer install-systemd | uninstall-systemd
//! a2dp-installer status [--json]
//! a2dp-installer diff
//! ```

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use a2dp_lifecycle::LifecycleError;
use commands::{status::StatusArgs, HostArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "a2dp-installer",
    version,
    about = "Install the A2DP Bluetooth agent as a pipx package and systemd service",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    host: HostArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deploy the package, then register and start the service.
    Install,

    /// Stop and deregister the service, then remove the package.
    Uninstall,

    /// Deploy the package only.
    InstallBin,

    /// Remove the package only.
    UninstallBin,

    /// Register and start the service only.
    InstallSystemd,

    /// Stop and deregister the service only.
    UninstallSystemd,

    /// Show package and service state.
    Status(StatusArgs),

    /// Show unified diff of what install-systemd would write.
    Diff,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.host.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.host.load_config()?;
    match cli.command {
        Commands::Install => commands::install::install(&config),
        Commands::Uninstall => commands::uninstall::uninstall(&config),
        Commands::InstallBin => commands::install::install_bin(&config),
        Commands::UninstallBin => commands::uninstall::uninstall_bin(&config),
        Commands::InstallSystemd => commands::install::install_systemd(&config),
        Commands::UninstallSystemd => commands::uninstall::uninstall_systemd(&config),
        Commands::Status(args) => args.run(&config),
        Commands::Diff => commands::diff::run(&config),
    }
}

/// Lifecycle failures carry their own code; anything else is a generic 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<LifecycleError>()
        .map(LifecycleError::exit_code)
        .unwrap_or(1)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
