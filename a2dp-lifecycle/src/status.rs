//! Host status snapshot for `a2dp-installer status`.

use std::path::PathBuf;

use serde::Serialize;

use a2dp_core::{InstallConfig, UnitState, UnitStatus};

/// Package + unit state as observed right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostStatus {
    pub package: String,
    pub package_installed: bool,
    pub entry_point: Option<PathBuf>,
    pub service: String,
    pub unit_path: PathBuf,
    pub policy_path: PathBuf,
    pub unit: UnitStatus,
    pub state: UnitState,
}

impl HostStatus {
    pub fn new(
        config: &InstallConfig,
        package_installed: bool,
        entry_point: Option<PathBuf>,
        unit: UnitStatus,
    ) -> Self {
        Self {
            package: config.package.0.clone(),
            package_installed,
            entry_point,
            service: config.service.unit_file_name(),
            unit_path: config.unit_path(),
            policy_path: config.policy_path(),
            unit,
            state: unit.state(),
        }
    }

    /// Fully installed: package present and unit enabled + running.
    pub fn is_installed(&self) -> bool {
        self.package_installed && self.state == UnitState::EnabledRunning
    }

    /// Fully absent: no package, no trace of the unit.
    pub fn is_absent(&self) -> bool {
        !self.package_installed && self.state == UnitState::Absent
    }
}
