//! Process execution port.
//!
//! Every call into pipx or systemctl goes through [`CommandRunner`]. The
//! production implementation is [`SystemRunner`]; tests substitute a fake
//! host that answers the same invocations without spawning anything.

use std::fmt;
use std::process::Command;

/// A single external command: program, arguments, extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Value of an environment override carried by this invocation.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Program and arguments without the environment, e.g. `systemctl start x.service`.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        f.write_str(&self.command_line())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Best single-line explanation of a failure: stderr, else stdout, else the exit code.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs an [`Invocation`] to completion and captures its output.
///
/// Blocking by contract: the installer waits for every step before the next.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// Production runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        tracing::debug!("exec: {invocation}");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_puts_env_first() {
        let inv = Invocation::new("pipx")
            .args(["install", "--force", "a2dp-agent"])
            .env("PIPX_HOME", "/opt/a2dp/pipx");
        assert_eq!(
            inv.to_string(),
            "PIPX_HOME=/opt/a2dp/pipx pipx install --force a2dp-agent"
        );
        assert_eq!(inv.command_line(), "pipx install --force a2dp-agent");
        assert_eq!(inv.env_value("PIPX_HOME"), Some("/opt/a2dp/pipx"));
        assert_eq!(inv.env_value("PIPX_BIN_DIR"), None);
    }

    #[test]
    fn failure_detail_prefers_stderr() {
        let out = CommandOutput {
            code: Some(1),
            stdout: "noise".into(),
            stderr: "  Unit a2dp-agent.service not found.\n".into(),
        };
        assert_eq!(out.failure_detail(), "Unit a2dp-agent.service not found.");

        let bare = CommandOutput {
            code: Some(5),
            ..CommandOutput::default()
        };
        assert_eq!(bare.failure_detail(), "exited with status 5");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_exit_code_and_stdout() {
        let out = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "echo hello; exit 3"]))
            .expect("spawn sh");
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert!(!out.success());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_passes_env() {
        let out = SystemRunner
            .run(
                &Invocation::new("sh")
                    .args(["-c", "printf %s \"$A2DP_PROBE\""])
                    .env("A2DP_PROBE", "set"),
            )
            .expect("spawn sh");
        assert!(out.success());
        assert_eq!(out.stdout, "set");
    }
}
