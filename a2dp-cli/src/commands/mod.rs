//! Subcommand implementations and the host options they share.

pub mod diff;
pub mod install;
pub mod status;
pub mod uninstall;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use a2dp_core::{InstallConfig, PackageName, ServiceName};

/// Options that describe the target host. Each one overrides the matching
/// key of the `--config` file.
#[derive(Args, Debug, Default)]
pub struct HostArgs {
    /// YAML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Package environment name (also the entry point name).
    #[arg(long, global = true)]
    pub package: Option<String>,

    /// Service unit name, without `.service`.
    #[arg(long, global = true)]
    pub service: Option<String>,

    /// Anything `pipx install` accepts: a PyPI name, wheel or checkout.
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Install the package environment and entry point under this root.
    #[arg(long, global = true, value_name = "DIR")]
    pub prefix: Option<PathBuf>,

    #[arg(long, global = true, value_name = "DIR")]
    pub unit_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "DIR")]
    pub policy_dir: Option<PathBuf>,

    /// Bluetooth adapter for the agent.
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Run the agent as this user.
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Debug logging (ignored when RUST_LOG is set).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl HostArgs {
    /// Defaults, then the config file, then flags. Validation happens when
    /// the lifecycle is built.
    pub fn load_config(&self) -> Result<InstallConfig> {
        let mut config = match &self.config {
            Some(path) => InstallConfig::load_at(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => InstallConfig::default(),
        };

        if let Some(package) = &self.package {
            config.package = PackageName::from(package.as_str());
        }
        if let Some(service) = &self.service {
            config.service = ServiceName::from(service.as_str());
        }
        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.install_prefix = Some(prefix.clone());
        }
        if let Some(dir) = &self.unit_dir {
            config.unit_dir = dir.clone();
        }
        if let Some(dir) = &self.policy_dir {
            config.policy_dir = dir.clone();
        }
        if let Some(device) = &self.device {
            config.device = device.clone();
        }
        if let Some(user) = &self.user {
            config.user = Some(user.clone());
        }
        tracing::debug!(?config, "effective configuration");
        Ok(config)
    }
}
