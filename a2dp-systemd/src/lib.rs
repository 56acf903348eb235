//! # a2dp-systemd
//!
//! Service Registration for the agent: renders the unit and D-Bus policy
//! descriptors, copies them into place when they changed, and drives
//! `systemctl` through reload / enable / start (and the reverse).
//!
//! ```rust,no_run
//! use std::path::Path;
//! use a2dp_core::{InstallConfig, SystemRunner};
//! use a2dp_systemd::ServiceRegistration;
//!
//! let config = InstallConfig::default();
//! let registration = ServiceRegistration::new(&config, &SystemRunner);
//! if let Err(err) = registration.register(Path::new("/usr/local/bin/a2dp-agent")) {
//!     eprintln!("{err}");
//! }
//! ```

pub mod descriptor;
pub mod diff;
pub mod error;
pub mod registration;
pub mod systemctl;
pub mod writer;

pub use diff::{diff_descriptors, DescriptorDiff};
pub use error::{ServiceError, Step};
pub use registration::{DeregisterReport, RegisterReport, ServiceRegistration};
pub use writer::CopyOutcome;
