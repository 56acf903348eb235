//! In-process fake of the two external collaborators, for tests.
//!
//! [`FakeHost`] answers the pipx and systemctl invocations the installer
//! issues. Package environments live on disk under the fake home (or under
//! `PIPX_HOME` / `PIPX_BIN_DIR` when the invocation sets them), so tests can
//! compare directory trees before and after a round trip. Unit supervision
//! state is kept in memory and mirrors systemd closely enough for ordering
//! checks: `enable`/`start` fail for units the last `daemon-reload` did not
//! see.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::runner::{CommandOutput, CommandRunner, Invocation};

const FAKE_VERSION: &str = "0.1.0";

#[derive(Debug, Default)]
struct State {
    calls: Vec<Invocation>,
    loaded: BTreeSet<String>,
    enabled: BTreeSet<String>,
    active: BTreeSet<String>,
    activating: BTreeSet<String>,
    failures: Vec<String>,
    missing_programs: BTreeSet<String>,
    source_names: HashMap<String, String>,
}

/// Scriptable stand-in for pipx + systemd.
#[derive(Debug)]
pub struct FakeHost {
    home: PathBuf,
    unit_dir: PathBuf,
    pipx: String,
    systemctl: String,
    state: RefCell<State>,
}

impl FakeHost {
    /// `home` anchors pipx's default directories; `unit_dir` is what
    /// `daemon-reload` scans.
    pub fn new(home: &Path, unit_dir: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            unit_dir: unit_dir.to_path_buf(),
            pipx: "pipx".to_string(),
            systemctl: "systemctl".to_string(),
            state: RefCell::new(State::default()),
        }
    }

    /// Program names to answer to, when the config overrides them.
    pub fn with_programs(mut self, pipx: &str, systemctl: &str) -> Self {
        self.pipx = pipx.to_string();
        self.systemctl = systemctl.to_string();
        self
    }

    /// Any invocation whose command line starts with `prefix` exits 1.
    pub fn fail_on(&self, prefix: &str) {
        self.state.borrow_mut().failures.push(prefix.to_string());
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().failures.clear();
    }

    /// Spawning `program` fails with `NotFound`.
    pub fn remove_program(&self, program: &str) {
        self.state
            .borrow_mut()
            .missing_programs
            .insert(program.to_string());
    }

    /// Package name pipx reports for `source`; defaults to the source's file name.
    pub fn map_source(&self, source: &str, package: &str) {
        self.state
            .borrow_mut()
            .source_names
            .insert(source.to_string(), package.to_string());
    }

    /// Every invocation so far, as `program arg...`.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .map(Invocation::command_line)
            .collect()
    }

    /// Invocations of `program`, with the program name stripped.
    pub fn calls_to(&self, program: &str) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|inv| inv.program == program)
            .map(|inv| inv.args.join(" "))
            .collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn is_loaded(&self, unit: &str) -> bool {
        self.state.borrow().loaded.contains(unit)
    }

    pub fn is_enabled(&self, unit: &str) -> bool {
        self.state.borrow().enabled.contains(unit)
    }

    /// Put `unit` in the `activating (auto-restart)` state a `Restart=` unit
    /// sits in between crashes: `is-active` exits 3 and prints `activating`.
    pub fn crash_loop(&self, unit: &str) {
        let mut state = self.state.borrow_mut();
        state.active.remove(unit);
        state.activating.insert(unit.to_string());
    }

    pub fn is_activating(&self, unit: &str) -> bool {
        self.state.borrow().activating.contains(unit)
    }

    pub fn is_active(&self, unit: &str) -> bool {
        self.state.borrow().active.contains(unit)
    }

    /// Default `PIPX_HOME` when an invocation does not override it.
    pub fn default_pipx_home(&self) -> PathBuf {
        self.home.join(".local").join("pipx")
    }

    /// Default `PIPX_BIN_DIR` when an invocation does not override it.
    pub fn default_bin_dir(&self) -> PathBuf {
        self.home.join(".local").join("bin")
    }

    fn pipx_home(&self, inv: &Invocation) -> PathBuf {
        inv.env_value("PIPX_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_pipx_home())
    }

    fn bin_dir(&self, inv: &Invocation) -> PathBuf {
        inv.env_value("PIPX_BIN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_bin_dir())
    }

    // -----------------------------------------------------------------------
    // pipx
    // -----------------------------------------------------------------------

    fn pipx(&self, inv: &Invocation) -> io::Result<CommandOutput> {
        let args: Vec<&str> = inv.args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["install", "--force", source] => self.pipx_install(inv, source, true),
            ["install", source] => self.pipx_install(inv, source, false),
            ["uninstall", name] => self.pipx_uninstall(inv, name),
            ["list", "--short"] => self.pipx_list(inv),
            ["environment", "--value", "PIPX_BIN_DIR"] => Ok(ok(format!(
                "{}\n",
                self.bin_dir(inv).display()
            ))),
            _ => Ok(fail(2, format!("fake pipx: unsupported arguments {args:?}"))),
        }
    }

    fn package_for(&self, source: &str) -> String {
        if let Some(name) = self.state.borrow().source_names.get(source) {
            return name.clone();
        }
        Path::new(source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string())
    }

    fn pipx_install(
        &self,
        inv: &Invocation,
        source: &str,
        force: bool,
    ) -> io::Result<CommandOutput> {
        let name = self.package_for(source);
        let venv = self.pipx_home(inv).join("venvs").join(&name);
        if venv.exists() {
            if !force {
                let message = format!(
                    "'{name}' already seems to be installed. \
                     Pass '--force' to force installation."
                );
                return Ok(fail(1, message));
            }
            fs::remove_dir_all(&venv)?;
        }
        fs::create_dir_all(&venv)?;
        fs::write(
            venv.join("pipx_metadata.json"),
            format!("{{\"source\":\"{source}\"}}\n"),
        )?;

        let bin_dir = self.bin_dir(inv);
        fs::create_dir_all(&bin_dir)?;
        fs::write(bin_dir.join(&name), format!("#!fake-entry-point {source}\n"))?;

        Ok(ok(format!(
            "installed package {name} {FAKE_VERSION}\n  - {name}\ndone! ✨ 🌟 ✨\n"
        )))
    }

    fn pipx_uninstall(&self, inv: &Invocation, name: &str) -> io::Result<CommandOutput> {
        let venv = self.pipx_home(inv).join("venvs").join(name);
        if !venv.exists() {
            return Ok(fail(1, format!("Nothing to uninstall for {name} 😴")));
        }
        fs::remove_dir_all(&venv)?;
        let entry = self.bin_dir(inv).join(name);
        if entry.exists() {
            fs::remove_file(entry)?;
        }
        Ok(ok(format!("uninstalled {name}! ✨ 🌟 ✨\n")))
    }

    fn pipx_list(&self, inv: &Invocation) -> io::Result<CommandOutput> {
        let venvs = self.pipx_home(inv).join("venvs");
        if !venvs.is_dir() {
            return Ok(ok(String::new()));
        }
        let mut names: Vec<String> = fs::read_dir(&venvs)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        let stdout = names
            .iter()
            .map(|n| format!("{n} {FAKE_VERSION}\n"))
            .collect::<String>();
        Ok(ok(stdout))
    }

    // -----------------------------------------------------------------------
    // systemctl
    // -----------------------------------------------------------------------

    fn systemctl(&self, inv: &Invocation) -> io::Result<CommandOutput> {
        let args: Vec<&str> = inv
            .args
            .iter()
            .map(String::as_str)
            .filter(|a| *a != "--quiet")
            .collect();
        let mut state = self.state.borrow_mut();
        let out = match args.as_slice() {
            ["daemon-reload"] => {
                state.loaded = self.unit_files()?;
                ok(String::new())
            }
            ["enable", unit] => {
                if state.loaded.contains(*unit) {
                    state.enabled.insert(unit.to_string());
                    ok(String::new())
                } else {
                    fail(1, format!("Failed to enable unit: Unit file {unit} does not exist."))
                }
            }
            ["disable", unit] => {
                state.enabled.remove(*unit);
                ok(String::new())
            }
            ["start", unit] => {
                if state.loaded.contains(*unit) {
                    state.activating.remove(*unit);
                    state.active.insert(unit.to_string());
                    ok(String::new())
                } else {
                    fail(5, format!("Failed to start {unit}: Unit {unit} not found."))
                }
            }
            ["stop", unit] => {
                let was_active = state.active.remove(*unit);
                let was_activating = state.activating.remove(*unit);
                if was_active || was_activating || state.loaded.contains(*unit) {
                    ok(String::new())
                } else {
                    fail(5, format!("Failed to stop {unit}: Unit {unit} not loaded."))
                }
            }
            ["is-enabled", unit] => {
                if state.enabled.contains(*unit) {
                    ok("enabled\n".to_string())
                } else {
                    fail(1, String::new()).with_stdout("disabled\n")
                }
            }
            ["is-active", unit] => {
                if state.active.contains(*unit) {
                    ok("active\n".to_string())
                } else if state.activating.contains(*unit) {
                    fail(3, String::new()).with_stdout("activating\n")
                } else {
                    fail(3, String::new()).with_stdout("inactive\n")
                }
            }
            _ => fail(1, format!("fake systemctl: unsupported arguments {args:?}")),
        };
        Ok(out)
    }

    fn unit_files(&self) -> io::Result<BTreeSet<String>> {
        if !self.unit_dir.is_dir() {
            return Ok(BTreeSet::new());
        }
        Ok(fs::read_dir(&self.unit_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".service"))
            .collect())
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.state.borrow_mut().calls.push(invocation.clone());

        if self
            .state
            .borrow()
            .missing_programs
            .contains(&invocation.program)
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", invocation.program),
            ));
        }

        let line = invocation.command_line();
        let injected = self
            .state
            .borrow()
            .failures
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()));
        if injected {
            return Ok(fail(1, format!("injected failure: {line}")));
        }

        if invocation.program == self.pipx {
            self.pipx(invocation)
        } else if invocation.program == self.systemctl {
            self.systemctl(invocation)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: not simulated by FakeHost", invocation.program),
            ))
        }
    }
}

fn ok(stdout: String) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout,
        stderr: String::new(),
    }
}

fn fail(code: i32, stderr: String) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr,
    }
}

trait WithStdout {
    fn with_stdout(self, stdout: &str) -> Self;
}

impl WithStdout for CommandOutput {
    fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn systemctl(host: &FakeHost, args: &[&str]) -> CommandOutput {
        host.run(&Invocation::new("systemctl").args(args.iter().copied()))
            .expect("fake systemctl")
    }

    #[test]
    fn enable_requires_reload_after_unit_file_appears() {
        let root = TempDir::new().expect("tempdir");
        let unit_dir = root.path().join("units");
        fs::create_dir_all(&unit_dir).expect("mkdir");
        let host = FakeHost::new(root.path(), &unit_dir);

        fs::write(unit_dir.join("x.service"), "[Unit]\n").expect("write unit");
        assert!(!systemctl(&host, &["enable", "x.service"]).success());

        assert!(systemctl(&host, &["daemon-reload"]).success());
        assert!(systemctl(&host, &["enable", "x.service"]).success());
        assert!(systemctl(&host, &["start", "x.service"]).success());
        assert!(systemctl(&host, &["is-active", "--quiet", "x.service"]).success());
        assert_eq!(
            host.calls_to("systemctl"),
            vec![
                "enable x.service",
                "daemon-reload",
                "enable x.service",
                "start x.service",
                "is-active --quiet x.service",
            ]
        );
    }

    #[test]
    fn pipx_install_replaces_and_uninstall_reports_absence() {
        let root = TempDir::new().expect("tempdir");
        let host = FakeHost::new(root.path(), &root.path().join("units"));
        let install = Invocation::new("pipx").args(["install", "--force", "a2dp-agent"]);

        assert!(host.run(&install).expect("install").success());
        assert!(host.run(&install).expect("reinstall").success());
        let list = host
            .run(&Invocation::new("pipx").args(["list", "--short"]))
            .expect("list");
        assert_eq!(list.stdout, "a2dp-agent 0.1.0\n");

        let uninstall = Invocation::new("pipx").args(["uninstall", "a2dp-agent"]);
        assert!(host.run(&uninstall).expect("uninstall").success());
        let again = host.run(&uninstall).expect("uninstall again");
        assert!(!again.success());
        assert!(again.stderr.contains("Nothing to uninstall"));
    }

    #[test]
    fn injected_failure_matches_prefix() {
        let root = TempDir::new().expect("tempdir");
        let host = FakeHost::new(root.path(), root.path());
        host.fail_on("systemctl daemon-reload");
        assert!(!systemctl(&host, &["daemon-reload"]).success());
        host.clear_failures();
        assert!(systemctl(&host, &["daemon-reload"]).success());
    }
}
