//! Composed install / uninstall sequences and the single-stage entry points.
//!
//! | Command             | Sequence                                          |
//! |---------------------|---------------------------------------------------|
//! | `install`           | deployment `install` → registration `register`    |
//! | `uninstall`         | registration `deregister` → deployment `uninstall`|
//! | `install-bin`       | deployment `install`                              |
//! | `uninstall-bin`     | deployment `uninstall`                            |
//! | `install-systemd`   | registration `register`                           |
//! | `uninstall-systemd` | registration `deregister`                         |
//!
//! Absence during uninstall (`NotInstalled`, `ServiceNotFound`) is logged
//! and reported as [`Removal::AlreadyAbsent`]; every other error aborts the
//! sequence at the stage that raised it.

use a2dp_core::{CommandRunner, InstallConfig};
use a2dp_deploy::{BinaryDeployment, Deployed, DeployError};
use a2dp_systemd::{
    diff_descriptors, DeregisterReport, DescriptorDiff, RegisterReport, ServiceError,
    ServiceRegistration,
};

use crate::error::LifecycleError;
use crate::status::HostStatus;

/// Result of a stage's removal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal<T> {
    Removed(T),
    AlreadyAbsent,
}

impl<T> Removal<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Removal::AlreadyAbsent)
    }
}

/// What `install` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub deployed: Deployed,
    pub registered: RegisterReport,
}

/// What an uninstall found on the host before removing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    /// Package and service were both fully present.
    Installed,
    /// Some pieces were already gone (e.g. removed by hand).
    Partial,
    /// Nothing was there to begin with.
    NeverInstalled,
}

/// What `uninstall` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub service: Removal<DeregisterReport>,
    pub package: Removal<()>,
}

impl UninstallReport {
    pub fn found(&self) -> Found {
        match (&self.service, &self.package) {
            (Removal::AlreadyAbsent, Removal::AlreadyAbsent) => Found::NeverInstalled,
            (Removal::Removed(service), Removal::Removed(())) if !service.was_partial() => {
                Found::Installed
            }
            _ => Found::Partial,
        }
    }
}

/// Entry point for every lifecycle command.
pub struct Lifecycle<'a, R: CommandRunner> {
    config: &'a InstallConfig,
    runner: &'a R,
}

impl<'a, R: CommandRunner> Lifecycle<'a, R> {
    /// Validates `config` up front so no stage starts on a bad value.
    pub fn new(config: &'a InstallConfig, runner: &'a R) -> Result<Self, LifecycleError> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    fn deployment(&self) -> BinaryDeployment<'a, R> {
        BinaryDeployment::new(self.config, self.runner)
    }

    fn registration(&self) -> ServiceRegistration<'a, R> {
        ServiceRegistration::new(self.config, self.runner)
    }

    /// Deploy the package, then register the service. A deployment failure
    /// means registration is never attempted.
    pub fn install(&self) -> Result<InstallReport, LifecycleError> {
        let deployed = self.install_bin()?;
        let registered = self.registration().register(&deployed.entry_point)?;
        Ok(InstallReport {
            deployed,
            registered,
        })
    }

    /// Deregister the service, then remove the package.
    pub fn uninstall(&self) -> Result<UninstallReport, LifecycleError> {
        let service = self.uninstall_systemd()?;
        let package = self.uninstall_bin()?;
        let report = UninstallReport { service, package };

        match report.found() {
            Found::Installed => tracing::info!("'{}' uninstalled", self.config.package),
            Found::Partial => tracing::warn!(
                "'{}' was only partially installed; removed what was left",
                self.config.package
            ),
            Found::NeverInstalled => tracing::info!(
                "'{}' was never installed; nothing to do",
                self.config.package
            ),
        }
        Ok(report)
    }

    pub fn install_bin(&self) -> Result<Deployed, LifecycleError> {
        Ok(self.deployment().install()?)
    }

    pub fn uninstall_bin(&self) -> Result<Removal<()>, LifecycleError> {
        match self.deployment().uninstall() {
            Ok(()) => Ok(Removal::Removed(())),
            Err(err @ DeployError::NotInstalled { .. }) => {
                tracing::warn!("{err}; skipping package removal");
                Ok(Removal::AlreadyAbsent)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Register the service against wherever the package's entry point is
    /// (or will be) installed.
    pub fn install_systemd(&self) -> Result<RegisterReport, LifecycleError> {
        let entry_point = self.deployment().entry_point()?;
        Ok(self.registration().register(&entry_point)?)
    }

    pub fn uninstall_systemd(&self) -> Result<Removal<DeregisterReport>, LifecycleError> {
        match self.registration().deregister() {
            Ok(report) => Ok(Removal::Removed(report)),
            Err(err @ ServiceError::ServiceNotFound { .. }) => {
                tracing::warn!("{err}; skipping service deregistration");
                Ok(Removal::AlreadyAbsent)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Current package and unit state, re-queried from the host.
    pub fn status(&self) -> Result<HostStatus, LifecycleError> {
        let deployment = self.deployment();
        let package_installed = deployment.is_installed()?;
        let entry_point = if package_installed {
            Some(deployment.entry_point()?)
        } else {
            None
        };
        let unit = self.registration().status();
        Ok(HostStatus::new(self.config, package_installed, entry_point, unit))
    }

    /// Descriptor changes `install-systemd` would make. Writes nothing.
    pub fn diff(&self) -> Result<Vec<DescriptorDiff>, LifecycleError> {
        let entry_point = self.deployment().entry_point()?;
        Ok(diff_descriptors(self.config, &entry_point)?)
    }
}
