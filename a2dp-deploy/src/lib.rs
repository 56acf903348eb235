//! # a2dp-deploy
//!
//! Binary Deployment: puts the agent package into an isolated pipx
//! environment and removes it again.
//!
//! [`BinaryDeployment::install`] is idempotent (reinstall replaces);
//! [`BinaryDeployment::uninstall`] reports absence as
//! [`DeployError::NotInstalled`] so callers can treat it as already done.

pub mod error;
pub mod pipx;

pub use error::DeployError;
pub use pipx::{BinaryDeployment, Deployed};
