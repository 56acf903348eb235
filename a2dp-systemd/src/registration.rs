//! Service Registration: descriptors in, unit enabled and running, and back.
//!
//! ## `register`
//!
//! 1. Render + copy the unit and policy descriptors (skipped when identical).
//! 2. `systemctl daemon-reload`
//! 3. `systemctl enable <unit>`
//! 4. `systemctl start <unit>`
//!
//! ## `deregister`
//!
//! 1. `systemctl disable <unit>`
//! 2. `systemctl stop <unit>` (only while active, activating or reloading)
//! 3. `systemctl daemon-reload`
//! 4. delete the unit descriptor, then the policy descriptor
//!
//! A failing step aborts the sequence and names itself. Earlier steps are
//! not undone; each is safe to repeat.

use std::path::{Path, PathBuf};

use a2dp_core::{CommandRunner, InstallConfig, UnitStatus};

use crate::descriptor;
use crate::error::ServiceError;
use crate::systemctl::Systemctl;
use crate::writer::{self, CopyOutcome};

/// What `register` did to the descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterReport {
    pub unit: CopyOutcome,
    pub policy: CopyOutcome,
}

/// What `deregister` found and removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeregisterReport {
    pub was_enabled: bool,
    pub was_running: bool,
    pub unit_removed: bool,
    pub policy_removed: bool,
}

impl DeregisterReport {
    /// Only part of a registration was left on the host (e.g. the unit file
    /// was deleted by hand but the policy stayed behind).
    pub fn was_partial(&self) -> bool {
        !(self.unit_removed && self.policy_removed)
    }
}

pub struct ServiceRegistration<'a, R: CommandRunner> {
    config: &'a InstallConfig,
    runner: &'a R,
}

impl<'a, R: CommandRunner> ServiceRegistration<'a, R> {
    pub fn new(config: &'a InstallConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    fn systemctl(&self) -> Systemctl<'a, R> {
        Systemctl::new(self.config.programs.systemctl.as_str(), self.runner)
    }

    /// `<service>.service`
    pub fn unit(&self) -> String {
        self.config.service.unit_file_name()
    }

    pub fn unit_path(&self) -> PathBuf {
        self.config.unit_path()
    }

    pub fn policy_path(&self) -> PathBuf {
        self.config.policy_path()
    }

    /// Drive the unit from any state to enabled + running.
    pub fn register(&self, entry_point: &Path) -> Result<RegisterReport, ServiceError> {
        let unit = self.unit();
        if !entry_point.exists() {
            tracing::warn!(
                "{} does not exist yet; {unit} will fail to start until the package is installed",
                entry_point.display()
            );
        }

        let rendered = descriptor::render(self.config, entry_point)?;
        let mkdir = self.config.mkdir();
        let unit_outcome =
            writer::sync_descriptor(&self.unit_path(), &rendered.unit, &mkdir, self.runner)?;
        let policy_outcome =
            writer::sync_descriptor(&self.policy_path(), &rendered.policy, &mkdir, self.runner)?;

        let systemctl = self.systemctl();
        tracing::info!("reloading systemd unit cache");
        systemctl.daemon_reload()?;
        tracing::info!("enabling {unit}");
        systemctl.enable(&unit)?;
        tracing::info!("starting {unit}");
        systemctl.start(&unit)?;

        tracing::info!("{unit} registered");
        Ok(RegisterReport {
            unit: unit_outcome,
            policy: policy_outcome,
        })
    }

    /// Drive the unit from any state to absent.
    ///
    /// Returns [`ServiceError::ServiceNotFound`] when no trace of the unit is
    /// left: no descriptors, not enabled, not running.
    pub fn deregister(&self) -> Result<DeregisterReport, ServiceError> {
        let unit = self.unit();
        let unit_path = self.unit_path();
        let policy_path = self.policy_path();
        let systemctl = self.systemctl();

        let unit_file = unit_path.exists();
        let policy_file = policy_path.exists();
        let was_enabled = systemctl.is_enabled(&unit);
        let was_running = systemctl.is_active(&unit);

        if !(unit_file || policy_file || was_enabled || was_running) {
            return Err(ServiceError::ServiceNotFound { unit });
        }

        if unit_file || was_enabled {
            tracing::info!("disabling {unit}");
            systemctl.disable(&unit)?;
        }
        if was_running {
            tracing::info!("stopping {unit}");
            systemctl.stop(&unit)?;
        } else {
            tracing::debug!("{unit} is not running");
        }
        tracing::info!("reloading systemd unit cache");
        systemctl.daemon_reload()?;

        let unit_removed = writer::remove_descriptor(&unit_path)?;
        let policy_removed = writer::remove_descriptor(&policy_path)?;

        let report = DeregisterReport {
            was_enabled,
            was_running,
            unit_removed,
            policy_removed,
        };
        if report.was_partial() {
            tracing::warn!(
                unit_removed,
                policy_removed,
                "{unit} was only partially installed"
            );
        }
        tracing::info!("{unit} deregistered");
        Ok(report)
    }

    /// Re-query descriptor presence and systemd's view of the unit.
    pub fn status(&self) -> UnitStatus {
        let unit = self.unit();
        let systemctl = self.systemctl();
        UnitStatus {
            unit_file: self.unit_path().exists(),
            policy_file: self.policy_path().exists(),
            enabled: systemctl.is_enabled(&unit),
            active: systemctl.is_active(&unit),
        }
    }
}
