//! `a2dp-installer status`: package and service visibility.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use a2dp_core::{InstallConfig, SystemRunner, UnitState};
use a2dp_lifecycle::{HostStatus, Lifecycle};

/// Arguments for `a2dp-installer status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, config: &InstallConfig) -> Result<()> {
        let runner = SystemRunner;
        let status = Lifecycle::new(config, &runner)?
            .status()
            .context("status query failed")?;

        if self.json {
            let json = serde_json::to_string_pretty(&status).context("serialize status")?;
            println!("{json}");
            return Ok(());
        }

        print_human(&status);
        Ok(())
    }
}

fn print_human(status: &HostStatus) {
    let package = if status.package_installed {
        "installed".green()
    } else {
        "not installed".dimmed()
    };
    println!("{:<9} {} ({})", "package".bold(), status.package, package);
    if let Some(entry) = &status.entry_point {
        println!("{:<9} {}", "", entry.display());
    }

    let state = match status.state {
        UnitState::EnabledRunning => "enabled, running".green(),
        UnitState::EnabledStopped => "enabled, stopped".yellow(),
        UnitState::Intermediate => "partially registered".yellow(),
        UnitState::Absent => "absent".dimmed(),
    };
    println!("{:<9} {} ({})", "service".bold(), status.service, state);
    println!("{:<9} {} {}", "", mark(status.unit.unit_file), status.unit_path.display());
    println!("{:<9} {} {}", "", mark(status.unit.policy_file), status.policy_path.display());
}

fn mark(present: bool) -> colored::ColoredString {
    if present {
        "✓".green()
    } else {
        "✗".red()
    }
}
