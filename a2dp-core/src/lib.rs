//! a2dp-core: configuration, domain types and the process-execution port
//! shared by the deployment and service-registration stages.
//!
//! - [`config`]: [`InstallConfig`], YAML loading and validation
//! - [`types`]: name newtypes and unit status
//! - [`runner`]: [`CommandRunner`] and the production [`SystemRunner`]
//! - [`mkdir`]: the configurable directory-creation primitive

pub mod config;
pub mod error;
pub mod mkdir;
pub mod runner;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{InstallConfig, Programs};
pub use error::ConfigError;
pub use mkdir::MkdirPrimitive;
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use types::{PackageName, ServiceName, UnitState, UnitStatus};
