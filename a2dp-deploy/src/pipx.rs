//! Binary Deployment through pipx.
//!
//! ## Layout
//!
//! ```text
//! <prefix>/
//!   pipx/venvs/<package>/   (PIPX_HOME: the isolated environment)
//!   bin/<package>           (PIPX_BIN_DIR: the entry point)
//! ```
//!
//! Without a prefix, pipx's own defaults apply (`~/.local/pipx`,
//! `~/.local/bin`). Installed state is never cached: every call re-asks pipx.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use a2dp_core::{CommandOutput, CommandRunner, InstallConfig, Invocation, PackageName};

use crate::error::DeployError;

/// Source suffixes that always name a file on disk.
const LOCAL_SUFFIXES: &[&str] = &[".whl", ".tar.gz", ".zip"];

/// Outcome of a successful [`BinaryDeployment::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    pub package: PackageName,
    pub entry_point: PathBuf,
    /// A previous installation under the same name was replaced.
    pub replaced: bool,
}

/// Installs and removes the agent's package environment.
pub struct BinaryDeployment<'a, R: CommandRunner> {
    config: &'a InstallConfig,
    runner: &'a R,
}

impl<'a, R: CommandRunner> BinaryDeployment<'a, R> {
    pub fn new(config: &'a InstallConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    fn package(&self) -> &PackageName {
        &self.config.package
    }

    /// `PIPX_HOME` under the install prefix, if one is configured.
    pub fn pipx_home(&self) -> Option<PathBuf> {
        self.config
            .install_prefix
            .as_ref()
            .map(|prefix| prefix.join("pipx"))
    }

    /// `PIPX_BIN_DIR` under the install prefix, if one is configured.
    pub fn bin_dir(&self) -> Option<PathBuf> {
        self.config
            .install_prefix
            .as_ref()
            .map(|prefix| prefix.join("bin"))
    }

    fn pipx(&self) -> Invocation {
        let mut inv = Invocation::new(self.config.programs.pipx.as_str());
        if let (Some(home), Some(bin)) = (self.pipx_home(), self.bin_dir()) {
            inv = inv
                .env("PIPX_HOME", home.display().to_string())
                .env("PIPX_BIN_DIR", bin.display().to_string());
        }
        inv
    }

    /// Install (or reinstall) the package so its entry point lands on the path.
    ///
    /// `pipx install --force` replaces any environment already registered
    /// under the package name, so repeated calls converge on one install.
    pub fn install(&self) -> Result<Deployed, DeployError> {
        self.check_source()?;

        let mkdir = self.config.mkdir();
        for dir in [self.pipx_home(), self.bin_dir()].into_iter().flatten() {
            mkdir
                .ensure_dir(&dir, self.runner)
                .map_err(|source| DeployError::Mkdir { path: dir, source })?;
        }

        let replaced = self
            .is_installed()
            .map_err(|e| self.install_err(e.to_string()))?;
        if replaced {
            tracing::info!("replacing existing installation of '{}'", self.package());
        }

        let inv = self
            .pipx()
            .args(["install", "--force", self.config.source.as_str()]);
        tracing::info!("installing '{}' from {}", self.package(), self.config.source);
        let output = self
            .runner
            .run(&inv)
            .map_err(|e| self.install_err(format!("`{}`: {e}", inv.command_line())))?;
        if !output.success() {
            return Err(self.install_err(output.failure_detail()));
        }

        let entry_point = self.entry_point()?;
        if !entry_point.exists() {
            return Err(self.install_err(format!(
                "pipx finished but the entry point {} is missing",
                entry_point.display()
            )));
        }

        tracing::info!("installed '{}' at {}", self.package(), entry_point.display());
        Ok(Deployed {
            package: self.package().clone(),
            entry_point,
            replaced,
        })
    }

    /// Remove the package environment and its entry point.
    ///
    /// Returns [`DeployError::NotInstalled`] when there is nothing to remove.
    pub fn uninstall(&self) -> Result<(), DeployError> {
        if !self.is_installed()? {
            return Err(DeployError::NotInstalled {
                package: self.package().clone(),
            });
        }

        let inv = self.pipx().args(["uninstall", self.package().0.as_str()]);
        tracing::info!("uninstalling '{}'", self.package());
        let output = self.runner.run(&inv).map_err(|e| DeployError::Uninstall {
            package: self.package().clone(),
            reason: format!("`{}`: {e}", inv.command_line()),
        })?;
        if !output.success() {
            return Err(DeployError::Uninstall {
                package: self.package().clone(),
                reason: output.failure_detail(),
            });
        }

        tracing::info!("removed package environment '{}'", self.package());
        Ok(())
    }

    /// Ask pipx whether the package environment exists.
    ///
    /// A missing pipx executable means nothing can be installed through it.
    pub fn is_installed(&self) -> Result<bool, DeployError> {
        let inv = self.pipx().args(["list", "--short"]);
        let output = match self.runner.run(&inv) {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    "{} not found; treating '{}' as absent",
                    inv.program,
                    self.package()
                );
                return Ok(false);
            }
            Err(e) => {
                return Err(DeployError::Query {
                    reason: format!("`{}`: {e}", inv.command_line()),
                })
            }
        };
        if !output.success() {
            return Err(DeployError::Query {
                reason: output.failure_detail(),
            });
        }
        Ok(list_contains(&output, self.package()))
    }

    /// Path of the installed entry point (whether or not it exists yet).
    pub fn entry_point(&self) -> Result<PathBuf, DeployError> {
        let name = self.package().0.as_str();
        if let Some(bin) = self.bin_dir() {
            return Ok(bin.join(name));
        }

        let inv = self
            .pipx()
            .args(["environment", "--value", "PIPX_BIN_DIR"]);
        match self.runner.run(&inv) {
            Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
                Ok(PathBuf::from(output.stdout.trim()).join(name))
            }
            Ok(output) => {
                tracing::debug!(
                    "`{}` gave no bin dir: {}",
                    inv.command_line(),
                    output.failure_detail()
                );
                default_bin_dir().map(|dir| dir.join(name))
            }
            Err(e) => {
                tracing::debug!("`{}` failed: {e}", inv.command_line());
                default_bin_dir().map(|dir| dir.join(name))
            }
        }
    }

    fn check_source(&self) -> Result<(), DeployError> {
        let source = self.config.source.trim();
        if source.is_empty() {
            return Err(self.install_err("package source is empty".to_string()));
        }
        if is_local_source(source) && !Path::new(source).exists() {
            return Err(self.install_err(format!("package source {source} does not exist")));
        }
        Ok(())
    }

    fn install_err(&self, reason: String) -> DeployError {
        DeployError::Install {
            package: self.package().clone(),
            reason,
        }
    }
}

/// `true` when `source` refers to something on the local filesystem rather
/// than a package index name or VCS URL.
pub fn is_local_source(source: &str) -> bool {
    source.starts_with('/')
        || source.starts_with("./")
        || source.starts_with("../")
        || source == "."
        || (LOCAL_SUFFIXES.iter().any(|s| source.ends_with(s)) && !source.contains("://"))
}

fn list_contains(output: &CommandOutput, package: &PackageName) -> bool {
    output
        .stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|name| name == package.0)
}

fn default_bin_dir() -> Result<PathBuf, DeployError> {
    dirs::home_dir()
        .map(|home| home.join(".local").join("bin"))
        .ok_or_else(|| DeployError::Query {
            reason: "cannot determine home directory for pipx's default bin dir".to_string(),
        })
}
