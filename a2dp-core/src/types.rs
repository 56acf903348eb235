//! Domain types shared by the deployment and registration stages.
//!
//! All path fields use `PathBuf`; names are newtypes so a package name can
//! never be passed where a unit name is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of the package environment (and of its entry point).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(pub String);

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of the managed systemd service, without the `.service` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(pub String);

impl ServiceName {
    /// `<name>.service`: the unit name systemctl is addressed with.
    pub fn unit_file_name(&self) -> String {
        format!("{}.service", self.0)
    }

    /// `<name>.conf`: the D-Bus policy file name.
    pub fn policy_file_name(&self) -> String {
        format!("{}.conf", self.0)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Unit state
// ---------------------------------------------------------------------------

/// Raw observations about the managed unit, re-queried on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitStatus {
    pub unit_file: bool,
    pub policy_file: bool,
    pub enabled: bool,
    pub active: bool,
}

/// The unit's lifecycle state as seen by the installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Absent,
    EnabledStopped,
    EnabledRunning,
    /// Any combination neither `register` nor `deregister` leaves behind,
    /// e.g. a unit file that exists but is disabled.
    Intermediate,
}

impl UnitStatus {
    pub fn state(&self) -> UnitState {
        match (self.unit_file, self.policy_file, self.enabled, self.active) {
            (false, false, false, false) => UnitState::Absent,
            (true, true, true, false) => UnitState::EnabledStopped,
            (true, true, true, true) => UnitState::EnabledRunning,
            _ => UnitState::Intermediate,
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::Absent => "absent",
            UnitState::EnabledStopped => "enabled, stopped",
            UnitState::EnabledRunning => "enabled, running",
            UnitState::Intermediate => "intermediate",
        };
        f.write_str(s)
    }
}
