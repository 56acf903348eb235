//! Unified diff support for `a2dp-installer diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use a2dp_core::InstallConfig;

use crate::descriptor;
use crate::error::{copy_err, ServiceError};

/// A single descriptor diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Render what `register` would copy and compare it to the installed
/// descriptors. Identical descriptors are left out. No files are written.
pub fn diff_descriptors(
    config: &InstallConfig,
    entry_point: &Path,
) -> Result<Vec<DescriptorDiff>, ServiceError> {
    let rendered = descriptor::render(config, entry_point)?;
    let targets = [
        (config.unit_path(), rendered.unit),
        (config.policy_path(), rendered.policy),
    ];

    let mut diffs = Vec::new();
    for (path, wanted) in targets {
        let installed = read_existing_or_empty(&path)?;
        if installed == wanted {
            continue;
        }
        let header = path.display().to_string();
        let unified = TextDiff::from_lines(&installed, &wanted)
            .unified_diff()
            .header(&format!("a{header}"), &format!("b{header}"))
            .context_radius(3)
            .to_string();
        diffs.push(DescriptorDiff {
            path,
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

fn read_existing_or_empty(path: &Path) -> Result<String, ServiceError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(copy_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(root: &Path) -> InstallConfig {
        InstallConfig {
            unit_dir: root.join("units"),
            policy_dir: root.join("dbus"),
            ..InstallConfig::default()
        }
    }

    #[test]
    fn fresh_host_diffs_both_descriptors() {
        let root = TempDir::new().expect("tempdir");
        let cfg = config(root.path());
        let diffs = diff_descriptors(&cfg, Path::new("/opt/bin/a2dp-agent")).expect("diff");
        assert_eq!(diffs.len(), 2);
        assert!(diffs[0].unified_diff.contains("+ExecStart=/opt/bin/a2dp-agent hci0"));
        assert!(!cfg.unit_path().exists(), "diff must not write");
    }

    #[test]
    fn installed_descriptors_produce_no_diff() {
        let root = TempDir::new().expect("tempdir");
        let cfg = config(root.path());
        let entry = Path::new("/opt/bin/a2dp-agent");
        let rendered = descriptor::render(&cfg, entry).expect("render");
        std::fs::create_dir_all(&cfg.unit_dir).expect("mkdir");
        std::fs::create_dir_all(&cfg.policy_dir).expect("mkdir");
        std::fs::write(cfg.unit_path(), &rendered.unit).expect("write unit");
        std::fs::write(cfg.policy_path(), &rendered.policy).expect("write policy");

        assert!(diff_descriptors(&cfg, entry).expect("diff").is_empty());

        let other = InstallConfig {
            device: "hci1".into(),
            ..cfg.clone()
        };
        let diffs = diff_descriptors(&other, entry).expect("diff");
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].unified_diff.contains("-ExecStart=/opt/bin/a2dp-agent hci0"));
        assert!(diffs[0].unified_diff.contains("+ExecStart=/opt/bin/a2dp-agent hci1"));
    }
}
