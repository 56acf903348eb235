//! Hash-gated atomic descriptor writer.
//!
//! ## `sync_descriptor` protocol
//!
//! 1. SHA-256 the rendered content.
//! 2. SHA-256 the installed copy, if any → skip if identical.
//! 3. Ensure the target directory exists (configured mkdir primitive).
//! 4. Write to `<path>.a2dp.tmp`.
//! 5. Rename to the final path (atomic on POSIX).
//!
//! An installed descriptor is therefore always either the previous version,
//! the new version, or absent.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use a2dp_core::{CommandRunner, MkdirPrimitive};

use crate::error::{copy_err, ServiceError};

/// Outcome of syncing one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Descriptor was missing or different and has been (re)written.
    Written { path: PathBuf },
    /// Installed copy already matches byte for byte.
    Unchanged { path: PathBuf },
}

impl CopyOutcome {
    pub fn path(&self) -> &Path {
        match self {
            CopyOutcome::Written { path } | CopyOutcome::Unchanged { path } => path,
        }
    }

    pub fn written(&self) -> bool {
        matches!(self, CopyOutcome::Written { .. })
    }
}

/// Hex SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.a2dp.tmp", path.display()))
}

/// Run `stage` against `tmp`. Whatever step fails, `tmp` is gone afterwards.
fn staged<T>(
    tmp: &Path,
    stage: impl FnOnce(&Path) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    stage(tmp).map_err(|err| {
        let _ = std::fs::remove_file(tmp);
        err
    })
}

/// Copy `content` to `path` unless an identical descriptor is already there.
pub fn sync_descriptor(
    path: &Path,
    content: &str,
    mkdir: &MkdirPrimitive,
    runner: &dyn CommandRunner,
) -> Result<CopyOutcome, ServiceError> {
    let wanted = digest(content.as_bytes());

    match std::fs::read(path) {
        Ok(existing) => {
            let installed = digest(&existing);
            if installed == wanted {
                tracing::debug!("unchanged: {} ({wanted})", path.display());
                return Ok(CopyOutcome::Unchanged {
                    path: path.to_path_buf(),
                });
            }
            tracing::debug!("{} differs ({installed} → {wanted})", path.display());
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(copy_err(path, e)),
    }

    if let Some(parent) = path.parent() {
        mkdir
            .ensure_dir(parent, runner)
            .map_err(|e| copy_err(parent, e))?;
    }

    staged(&tmp_path(path), |tmp| {
        std::fs::write(tmp, content).map_err(|e| copy_err(tmp, e))?;
        set_descriptor_permissions(tmp)?;
        std::fs::rename(tmp, path).map_err(|e| copy_err(path, e))
    })?;

    tracing::info!("wrote: {}", path.display());
    Ok(CopyOutcome::Written {
        path: path.to_path_buf(),
    })
}

/// Delete an installed descriptor. Returns `false` when it was already gone.
pub fn remove_descriptor(path: &Path) -> Result<bool, ServiceError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::info!("removed: {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ServiceError::RemoveFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(unix)]
fn set_descriptor_permissions(path: &Path) -> Result<(), ServiceError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
        .map_err(|e| copy_err(path, e))
}

#[cfg(not(unix))]
fn set_descriptor_permissions(_path: &Path) -> Result<(), ServiceError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2dp_core::SystemRunner;
    use std::fs;
    use tempfile::TempDir;

    fn sync(path: &Path, content: &str) -> CopyOutcome {
        sync_descriptor(path, content, &MkdirPrimitive::Native, &SystemRunner).expect("sync")
    }

    #[test]
    fn writes_missing_descriptor_and_creates_parent() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("etc/systemd/system/a2dp-agent.service");

        let outcome = sync(&path, "[Unit]\n");
        assert!(outcome.written());
        assert_eq!(fs::read_to_string(&path).expect("read"), "[Unit]\n");
        assert!(!tmp_path(&path).exists(), ".tmp must be removed after rename");
    }

    #[test]
    fn failed_step_after_write_leaves_no_tmp_file() {
        let dir = TempDir::new().expect("tempdir");
        let tmp = tmp_path(&dir.path().join("a2dp-agent.service"));

        let err = staged(&tmp, |tmp| {
            fs::write(tmp, "[Unit]\n").expect("write tmp");
            Err::<(), _>(copy_err(
                tmp,
                std::io::Error::new(ErrorKind::PermissionDenied, "chmod refused"),
            ))
        })
        .unwrap_err();

        assert!(matches!(err, ServiceError::Copy { .. }), "got: {err}");
        assert!(!tmp.exists(), "tmp must be cleaned up on failure");
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn identical_descriptor_is_left_untouched() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("a2dp-agent.service");
        sync(&path, "[Unit]\n");
        let before = fs::metadata(&path).expect("meta").modified().expect("mtime");

        let outcome = sync(&path, "[Unit]\n");
        assert_eq!(outcome, CopyOutcome::Unchanged { path: path.clone() });
        let after = fs::metadata(&path).expect("meta").modified().expect("mtime");
        assert_eq!(before, after);
    }

    #[test]
    fn different_descriptor_is_replaced_wholesale() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("a2dp-agent.service");
        fs::write(&path, "[Unit]\nDescription=hand edited\nExtra=1\n").expect("seed");

        assert!(sync(&path, "[Unit]\n").written());
        assert_eq!(fs::read_to_string(&path).expect("read"), "[Unit]\n");
    }

    #[cfg(unix)]
    #[test]
    fn written_descriptor_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("a2dp-agent.conf");
        sync(&path, "<busconfig/>\n");
        let mode = fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn remove_reports_absence() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("a2dp-agent.service");
        fs::write(&path, "x").expect("seed");
        assert!(remove_descriptor(&path).expect("remove"));
        assert!(!remove_descriptor(&path).expect("remove again"));
    }
}
