//! `a2dp-installer uninstall`, `uninstall-bin` and `uninstall-systemd`.
//!
//! Absence is not an error: uninstalling from a clean host exits 0.

use anyhow::{Context, Result};
use colored::Colorize;

use a2dp_core::{InstallConfig, SystemRunner};
use a2dp_lifecycle::{Found, Lifecycle, Removal};

pub fn uninstall(config: &InstallConfig) -> Result<()> {
    let runner = SystemRunner;
    let report = Lifecycle::new(config, &runner)?
        .uninstall()
        .context("uninstall failed")?;

    let summary = match report.found() {
        Found::Installed => format!("{} {} uninstalled", "✓".green(), config.package),
        Found::Partial => format!(
            "{} {} was partially installed; leftovers removed",
            "✓".yellow(),
            config.package
        ),
        Found::NeverInstalled => format!("{} {} was not installed", "-".dimmed(), config.package),
    };
    println!("{summary}");
    Ok(())
}

pub fn uninstall_bin(config: &InstallConfig) -> Result<()> {
    let runner = SystemRunner;
    let removal = Lifecycle::new(config, &runner)?
        .uninstall_bin()
        .context("uninstall-bin failed")?;
    print_removal("package", &config.package.to_string(), removal.is_absent());
    Ok(())
}

pub fn uninstall_systemd(config: &InstallConfig) -> Result<()> {
    let runner = SystemRunner;
    let removal = Lifecycle::new(config, &runner)?
        .uninstall_systemd()
        .context("uninstall-systemd failed")?;
    if let Removal::Removed(report) = &removal {
        if report.was_partial() {
            println!("  {:>10} some descriptors were already missing", "note".yellow());
        }
    }
    print_removal("service", &config.service.unit_file_name(), removal.is_absent());
    Ok(())
}

fn print_removal(what: &str, name: &str, absent: bool) {
    if absent {
        println!("  {:>10} {what} {name} (not present)", "skipped".dimmed());
    } else {
        println!("  {:>10} {what} {name}", "removed".green());
    }
}
