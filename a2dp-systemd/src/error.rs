//! Error types for a2dp-systemd.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The registration step an error belongs to; what the operator retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CopyDescriptors,
    Reload,
    Enable,
    Start,
    Disable,
    Stop,
    Remove,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::CopyDescriptors => "copy descriptors",
            Step::Reload => "daemon-reload",
            Step::Enable => "enable",
            Step::Start => "start",
            Step::Disable => "disable",
            Step::Stop => "stop",
            Step::Remove => "remove descriptors",
        };
        f.write_str(s)
    }
}

/// All errors that can arise from registering or deregistering the unit.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Tera could not parse or render a descriptor template.
    #[error("failed to render {name}: {source}")]
    Render {
        name: &'static str,
        #[source]
        source: tera::Error,
    },

    /// A template override could not be read.
    #[error("cannot read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A descriptor could not be written into its target directory.
    #[error("failed to copy descriptor to {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("systemctl daemon-reload failed: {detail}")]
    ReloadFailed { detail: String },

    #[error("failed to enable {unit}: {detail}")]
    EnableFailed { unit: String, detail: String },

    #[error("failed to start {unit}: {detail}")]
    StartFailed { unit: String, detail: String },

    #[error("failed to disable {unit}: {detail}")]
    DisableFailed { unit: String, detail: String },

    #[error("failed to stop {unit}: {detail}")]
    StopFailed { unit: String, detail: String },

    /// A descriptor could not be deleted.
    #[error("failed to remove {path}: {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing of the unit is left on the host. Deregistration treats this as done.
    #[error("service {unit} is not installed")]
    ServiceNotFound { unit: String },
}

impl ServiceError {
    /// `true` for the benign absence case deregistration reports.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::ServiceNotFound { .. })
    }

    /// The step that failed, if the error belongs to one.
    pub fn step(&self) -> Option<Step> {
        match self {
            ServiceError::Render { .. }
            | ServiceError::Template { .. }
            | ServiceError::Copy { .. } => Some(Step::CopyDescriptors),
            ServiceError::ReloadFailed { .. } => Some(Step::Reload),
            ServiceError::EnableFailed { .. } => Some(Step::Enable),
            ServiceError::StartFailed { .. } => Some(Step::Start),
            ServiceError::DisableFailed { .. } => Some(Step::Disable),
            ServiceError::StopFailed { .. } => Some(Step::Stop),
            ServiceError::RemoveFailed { .. } => Some(Step::Remove),
            ServiceError::ServiceNotFound { .. } => None,
        }
    }

    /// Process exit code, distinct per failing step.
    pub fn exit_code(&self) -> u8 {
        match self.step() {
            Some(Step::CopyDescriptors) => 20,
            Some(Step::Reload) => 21,
            Some(Step::Enable) => 22,
            Some(Step::Start) => 23,
            Some(Step::Disable) => 24,
            Some(Step::Stop) => 25,
            Some(Step::Remove) => 26,
            None => 0,
        }
    }
}

pub(crate) fn copy_err(path: impl Into<PathBuf>, source: std::io::Error) -> ServiceError {
    ServiceError::Copy {
        path: path.into(),
        source,
    }
}
