//! Thin `systemctl` wrapper. One method per init-system call; each failing
//! call maps to the error variant of its step.

use a2dp_core::{CommandRunner, Invocation};

use crate::error::ServiceError;

pub struct Systemctl<'a, R: CommandRunner> {
    program: &'a str,
    runner: &'a R,
}

impl<'a, R: CommandRunner> Systemctl<'a, R> {
    pub fn new(program: &'a str, runner: &'a R) -> Self {
        Self { program, runner }
    }

    fn invocation(&self, args: &[&str]) -> Invocation {
        Invocation::new(self.program).args(args.iter().copied())
    }

    /// Run and require exit 0; the error string is the failure detail.
    fn run_checked(&self, args: &[&str]) -> Result<(), String> {
        let inv = self.invocation(args);
        tracing::debug!("{}", inv.command_line());
        let output = self
            .runner
            .run(&inv)
            .map_err(|e| format!("`{}`: {e}", inv.command_line()))?;
        if output.success() {
            Ok(())
        } else {
            Err(output.failure_detail())
        }
    }

    /// Run a `--quiet` query; anything but exit 0 (spawn failures included) is `false`.
    fn query(&self, verb: &str, unit: &str) -> bool {
        let inv = self.invocation(&[verb, "--quiet", unit]);
        match self.runner.run(&inv) {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::debug!("`{}` failed: {e}", inv.command_line());
                false
            }
        }
    }

    pub fn daemon_reload(&self) -> Result<(), ServiceError> {
        self.run_checked(&["daemon-reload"])
            .map_err(|detail| ServiceError::ReloadFailed { detail })
    }

    pub fn enable(&self, unit: &str) -> Result<(), ServiceError> {
        self.run_checked(&["enable", unit])
            .map_err(|detail| ServiceError::EnableFailed {
                unit: unit.to_string(),
                detail,
            })
    }

    pub fn start(&self, unit: &str) -> Result<(), ServiceError> {
        self.run_checked(&["start", unit])
            .map_err(|detail| ServiceError::StartFailed {
                unit: unit.to_string(),
                detail,
            })
    }

    pub fn disable(&self, unit: &str) -> Result<(), ServiceError> {
        self.run_checked(&["disable", unit])
            .map_err(|detail| ServiceError::DisableFailed {
                unit: unit.to_string(),
                detail,
            })
    }

    pub fn stop(&self, unit: &str) -> Result<(), ServiceError> {
        self.run_checked(&["stop", unit])
            .map_err(|detail| ServiceError::StopFailed {
                unit: unit.to_string(),
                detail,
            })
    }

    pub fn is_enabled(&self, unit: &str) -> bool {
        self.query("is-enabled", unit)
    }

    /// `true` for `active` and for the transitional states a unit passes
    /// through while starting, restarting or stopping. `is-active` exits
    /// non-zero for the latter, so its stdout decides.
    pub fn is_active(&self, unit: &str) -> bool {
        let inv = self.invocation(&["is-active", unit]);
        match self.runner.run(&inv) {
            Ok(output) if output.success() => true,
            Ok(output) => is_transitional(output.stdout.trim()),
            Err(e) => {
                tracing::debug!("`{}` failed: {e}", inv.command_line());
                false
            }
        }
    }
}

fn is_transitional(state: &str) -> bool {
    matches!(state, "activating" | "deactivating" | "reloading" | "refreshing")
}
