//! # a2dp-lifecycle
//!
//! The install/uninstall orchestrator. Composes Binary Deployment
//! (`a2dp-deploy`) and Service Registration (`a2dp-systemd`) in dependency
//! order and decides which failures are fatal.
//!
//! Call [`Lifecycle::install`] / [`Lifecycle::uninstall`] for the full
//! sequences, or the `*_bin` / `*_systemd` methods for one stage.

pub mod error;
pub mod lifecycle;
pub mod status;

pub use error::LifecycleError;
pub use lifecycle::{Found, InstallReport, Lifecycle, Removal, UninstallReport};
pub use status::HostStatus;
