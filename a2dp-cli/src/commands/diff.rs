//! `a2dp-installer diff`: show what `install-systemd` would write.

use anyhow::{Context, Result};

use a2dp_core::{InstallConfig, SystemRunner};
use a2dp_lifecycle::Lifecycle;

pub fn run(config: &InstallConfig) -> Result<()> {
    let runner = SystemRunner;
    let diffs = Lifecycle::new(config, &runner)?
        .diff()
        .context("diff failed")?;

    if diffs.is_empty() {
        println!("No differences for '{}'.", config.service.unit_file_name());
        return Ok(());
    }

    for diff in diffs {
        print!("{}", diff.unified_diff);
        if !diff.unified_diff.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
