//! Error types for a2dp-lifecycle.

use thiserror::Error;

use a2dp_core::ConfigError;
use a2dp_deploy::DeployError;
use a2dp_systemd::ServiceError;

/// Any failure of a lifecycle command, tagged with the stage it came from.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("binary deployment: {0}")]
    Deploy(#[from] DeployError),

    #[error("service registration: {0}")]
    Service(#[from] ServiceError),
}

impl LifecycleError {
    /// Distinct per failing stage and step; see the CLI's exit-code table.
    pub fn exit_code(&self) -> u8 {
        match self {
            LifecycleError::Config(_) => 1,
            LifecycleError::Deploy(e) => e.exit_code(),
            LifecycleError::Service(e) => e.exit_code(),
        }
    }
}
