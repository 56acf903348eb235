//! Error types for a2dp-deploy.

use std::path::PathBuf;

use thiserror::Error;

use a2dp_core::PackageName;

/// All errors that can arise while deploying or removing the agent package.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The package could not be installed. Fatal: registration never runs.
    #[error("failed to install package '{package}': {reason}")]
    Install { package: PackageName, reason: String },

    /// The package environment does not exist. Uninstall treats this as done.
    #[error("package '{package}' is not installed")]
    NotInstalled { package: PackageName },

    /// The package exists but pipx could not remove it.
    #[error("failed to uninstall package '{package}': {reason}")]
    Uninstall { package: PackageName, reason: String },

    /// pipx could not report which packages are installed.
    #[error("cannot query installed packages: {reason}")]
    Query { reason: String },

    /// A target directory for the package environment could not be created.
    #[error("cannot create {path}: {source}")]
    Mkdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// `true` for the benign absence case uninstall swallows.
    pub fn is_not_installed(&self) -> bool {
        matches!(self, DeployError::NotInstalled { .. })
    }

    /// Process exit code for the stage that failed.
    pub fn exit_code(&self) -> u8 {
        match self {
            DeployError::Install { .. } | DeployError::Mkdir { .. } => 10,
            DeployError::NotInstalled { .. } => 0,
            DeployError::Uninstall { .. } => 11,
            DeployError::Query { .. } => 1,
        }
    }
}
