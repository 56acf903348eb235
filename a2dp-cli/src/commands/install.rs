//! `a2dp-installer install`, `install-bin` and `install-systemd`.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use a2dp_core::{InstallConfig, SystemRunner};
use a2dp_lifecycle::Lifecycle;
use a2dp_systemd::{CopyOutcome, RegisterReport};

pub fn install(config: &InstallConfig) -> Result<()> {
    let runner = SystemRunner;
    let report = Lifecycle::new(config, &runner)?
        .install()
        .context("install failed")?;

    print_deployed(&report.deployed.entry_point, report.deployed.replaced);
    print_registered(&report.registered);
    println!("{} {} installed", "✓".green(), config.package);
    Ok(())
}

pub fn install_bin(config: &InstallConfig) -> Result<()> {
    let runner = SystemRunner;
    let deployed = Lifecycle::new(config, &runner)?
        .install_bin()
        .context("install-bin failed")?;
    print_deployed(&deployed.entry_point, deployed.replaced);
    Ok(())
}

pub fn install_systemd(config: &InstallConfig) -> Result<()> {
    let runner = SystemRunner;
    let report = Lifecycle::new(config, &runner)?
        .install_systemd()
        .context("install-systemd failed")?;
    print_registered(&report);
    Ok(())
}

fn print_deployed(entry_point: &Path, replaced: bool) {
    let verb = if replaced { "reinstalled" } else { "installed" };
    println!("  {:>10} {}", verb.green(), entry_point.display());
}

fn print_registered(report: &RegisterReport) {
    for outcome in [&report.unit, &report.policy] {
        match outcome {
            CopyOutcome::Written { path } => {
                println!("  {:>10} {}", "wrote".green(), path.display())
            }
            CopyOutcome::Unchanged { path } => {
                println!("  {:>10} {}", "unchanged".dimmed(), path.display())
            }
        }
    }
}
