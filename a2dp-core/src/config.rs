//! Installer configuration.
//!
//! # Layering
//!
//! 1. [`InstallConfig::default`]: built-in values for a stock systemd host.
//! 2. Optional YAML file ([`InstallConfig::load_at`]); omitted keys keep
//!    their defaults.
//! 3. Command-line overrides, applied by the binary.
//! 4. [`InstallConfig::validate`] before any stage runs.
//!
//! ```yaml
//! package: a2dp-agent
//! source: ./dist/a2dp_agent-0.1.0-py3-none-any.whl
//! device: hci1
//! install_prefix: /opt/a2dp
//! unit_dir: /etc/systemd/system
//! mkdir_command: [install, -d, -m, "0755"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::mkdir::MkdirPrimitive;
use crate::types::{PackageName, ServiceName};

pub const DEFAULT_NAME: &str = "a2dp-agent";
pub const DEFAULT_DEVICE: &str = "hci0";
pub const DEFAULT_UNIT_DIR: &str = "/etc/systemd/system";
pub const DEFAULT_POLICY_DIR: &str = "/etc/dbus-1/system.d";

/// Program names for the two external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Programs {
    pub pipx: String,
    pub systemctl: String,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            pipx: "pipx".to_string(),
            systemctl: "systemctl".to_string(),
        }
    }
}

/// Everything the two stages need to know about the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    /// Package environment name; also the entry point's file name.
    pub package: PackageName,
    /// Unit name without the `.service` suffix.
    pub service: ServiceName,
    /// Anything `pipx install` accepts: a PyPI name, a wheel, a local checkout.
    pub source: String,
    /// Bluetooth adapter handed to the agent (`hci0`, `hci1`, ...).
    pub device: String,
    /// Pass `--verbose` to the agent in the unit's `ExecStart=`.
    pub agent_verbose: bool,
    /// Run the agent as this user instead of root.
    pub user: Option<String>,
    /// Root for the package environment and entry point; pipx defaults when unset.
    pub install_prefix: Option<PathBuf>,
    pub unit_dir: PathBuf,
    pub policy_dir: PathBuf,
    /// Command used to create missing directories; empty means `create_dir_all`.
    pub mkdir_command: Vec<String>,
    /// Replaces the built-in unit template.
    pub unit_template: Option<PathBuf>,
    /// Replaces the built-in policy template.
    pub policy_template: Option<PathBuf>,
    pub programs: Programs,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            package: PackageName::from(DEFAULT_NAME),
            service: ServiceName::from(DEFAULT_NAME),
            source: DEFAULT_NAME.to_string(),
            device: DEFAULT_DEVICE.to_string(),
            agent_verbose: false,
            user: None,
            install_prefix: None,
            unit_dir: PathBuf::from(DEFAULT_UNIT_DIR),
            policy_dir: PathBuf::from(DEFAULT_POLICY_DIR),
            mkdir_command: Vec::new(),
            unit_template: None,
            policy_template: None,
            programs: Programs::default(),
        }
    }
}

impl InstallConfig {
    /// Load a YAML config file. Missing keys fall back to defaults.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<unit_dir>/<service>.service`
    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join(self.service.unit_file_name())
    }

    /// `<policy_dir>/<service>.conf`
    pub fn policy_path(&self) -> PathBuf {
        self.policy_dir.join(self.service.policy_file_name())
    }

    pub fn mkdir(&self) -> MkdirPrimitive {
        MkdirPrimitive::from_command(&self.mkdir_command)
    }

    /// Reject values that would make a stage address the wrong file or unit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_name("package", &self.package.0)?;
        check_name("service", &self.service.0)?;
        if self.service.0.ends_with(".service") {
            return Err(invalid("service", "give the unit name without the `.service` suffix"));
        }
        if self.source.trim().is_empty() {
            return Err(invalid("source", "must not be empty"));
        }
        check_name("device", &self.device)?;
        if let Some(user) = &self.user {
            check_name("user", user)?;
        }
        check_absolute("unit_dir", &self.unit_dir)?;
        check_absolute("policy_dir", &self.policy_dir)?;
        if let Some(prefix) = &self.install_prefix {
            check_absolute("install_prefix", prefix)?;
        }
        if self.programs.pipx.trim().is_empty() {
            return Err(invalid("programs.pipx", "must not be empty"));
        }
        if self.programs.systemctl.trim().is_empty() {
            return Err(invalid("programs.systemctl", "must not be empty"));
        }
        if self.mkdir_command.iter().any(|part| part.is_empty()) {
            return Err(invalid("mkdir_command", "must not contain empty arguments"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(invalid(
            field,
            format!("'{value}' must not contain '/' or whitespace"),
        ));
    }
    Ok(())
}

fn check_absolute(field: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("'{}' must be an absolute path", path.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        InstallConfig::default().validate().expect("defaults are valid");
    }

    #[test]
    fn descriptor_paths_follow_service_name() {
        let cfg = InstallConfig {
            service: ServiceName::from("bt-agent"),
            unit_dir: PathBuf::from("/run/systemd/system"),
            ..InstallConfig::default()
        };
        assert_eq!(
            cfg.unit_path(),
            PathBuf::from("/run/systemd/system/bt-agent.service")
        );
        assert_eq!(
            cfg.policy_path(),
            PathBuf::from("/etc/dbus-1/system.d/bt-agent.conf")
        );
    }
}
