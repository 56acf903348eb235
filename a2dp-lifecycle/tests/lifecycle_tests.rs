//! End-to-end lifecycle scenarios against `a2dp_core::testing::FakeHost`.

use std::fs;
use std::path::Path;

use a2dp_core::testing::FakeHost;
use a2dp_core::{CommandRunner, InstallConfig, Invocation, UnitState};
use a2dp_deploy::DeployError;
use a2dp_lifecycle::{Found, Lifecycle, LifecycleError, Removal};
use rstest::rstest;
use tempfile::TempDir;

const UNIT: &str = "a2dp-agent.service";

struct Fixture {
    root: TempDir,
    config: InstallConfig,
    host: FakeHost,
}

fn fixture() -> Fixture {
    let root = TempDir::new().expect("tempdir");
    let config = InstallConfig {
        install_prefix: Some(root.path().join("opt")),
        unit_dir: root.path().join("etc/systemd/system"),
        policy_dir: root.path().join("etc/dbus-1/system.d"),
        ..InstallConfig::default()
    };
    let host = FakeHost::new(&root.path().join("home"), &config.unit_dir);
    Fixture { root, config, host }
}

fn lifecycle(f: &Fixture) -> Lifecycle<'_, FakeHost> {
    Lifecycle::new(&f.config, &f.host).expect("valid config")
}

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    if !dir.is_dir() {
        return vec![];
    }
    let mut files: Vec<_> = fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| {
            (
                e.file_name().to_string_lossy().into_owned(),
                fs::read(e.path()).expect("read file"),
            )
        })
        .collect();
    files.sort();
    files
}

fn installed_packages(f: &Fixture) -> String {
    let prefix = f.config.install_prefix.as_ref().expect("prefix");
    let inv = Invocation::new("pipx")
        .env("PIPX_HOME", prefix.join("pipx").display().to_string())
        .env("PIPX_BIN_DIR", prefix.join("bin").display().to_string())
        .args(["list", "--short"]);
    f.host.run(&inv).expect("pipx list").stdout
}

/// Position of the first call starting with `prefix` in the full call log.
fn position(f: &Fixture, prefix: &str) -> usize {
    f.host
        .calls()
        .iter()
        .position(|c| c.starts_with(prefix))
        .unwrap_or_else(|| panic!("no call starting with {prefix:?}: {:?}", f.host.calls()))
}

// ---------------------------------------------------------------------------
// 1. install
// ---------------------------------------------------------------------------

#[test]
fn install_on_fresh_host_deploys_then_registers() {
    let f = fixture();
    let report = lifecycle(&f).install().expect("install");

    let entry = f.root.path().join("opt/bin/a2dp-agent");
    assert_eq!(report.deployed.entry_point, entry);
    assert!(report.registered.unit.written());

    assert!(position(&f, "pipx install") < position(&f, "systemctl daemon-reload"));
    assert!(position(&f, "systemctl daemon-reload") < position(&f, "systemctl enable"));
    assert!(position(&f, "systemctl enable") < position(&f, "systemctl start"));

    let status = lifecycle(&f).status().expect("status");
    assert!(status.is_installed(), "{status:?}");
    assert_eq!(status.entry_point.as_deref(), Some(entry.as_path()));

    let unit = fs::read_to_string(f.config.unit_path()).expect("read unit");
    assert!(unit.contains(&format!("ExecStart={} hci0", entry.display())));
}

#[test]
fn install_twice_converges_on_one_install() {
    let f = fixture();
    lifecycle(&f).install().expect("first");
    let units = snapshot(&f.config.unit_dir);
    let policies = snapshot(&f.config.policy_dir);
    let packages = installed_packages(&f);

    let second = lifecycle(&f).install().expect("second");
    assert!(second.deployed.replaced);
    assert!(!second.registered.unit.written());
    assert!(!second.registered.policy.written());

    assert_eq!(snapshot(&f.config.unit_dir), units);
    assert_eq!(snapshot(&f.config.policy_dir), policies);
    assert_eq!(installed_packages(&f), packages);
    assert_eq!(packages.lines().count(), 1);
    assert!(f.host.is_enabled(UNIT) && f.host.is_active(UNIT));
}

#[rstest]
#[case("pipx install")]
#[case("pipx list")]
fn deploy_failure_never_touches_systemd(#[case] failing: &str) {
    let f = fixture();
    f.host.fail_on(failing);

    let err = lifecycle(&f).install().unwrap_err();
    assert!(
        matches!(err, LifecycleError::Deploy(DeployError::Install { .. })),
        "got: {err}"
    );
    assert_eq!(err.exit_code(), 10);
    assert!(f.host.calls_to("systemctl").is_empty());
    assert!(!f.config.unit_path().exists());
}

#[test]
fn missing_local_source_fails_before_any_process() {
    let mut f = fixture();
    f.config.source = f.root.path().join("dist/missing.whl").display().to_string();

    let err = lifecycle(&f).install().unwrap_err();
    assert_eq!(err.exit_code(), 10);
    assert!(f.host.calls().is_empty(), "{:?}", f.host.calls());
}

#[test]
fn registration_failure_reports_its_step() {
    let f = fixture();
    f.host.fail_on("systemctl enable");

    let err = lifecycle(&f).install().unwrap_err();
    assert!(matches!(err, LifecycleError::Service(_)), "got: {err}");
    assert_eq!(err.exit_code(), 22);
    // No rollback of the deployed package.
    assert_eq!(installed_packages(&f).lines().count(), 1);
}

#[test]
fn invalid_config_is_rejected_before_any_stage() {
    let mut f = fixture();
    f.config.unit_dir = "relative/units".into();

    let err = Lifecycle::new(&f.config, &f.host).err().expect("invalid config");
    assert!(matches!(err, LifecycleError::Config(_)), "got: {err}");
    assert_eq!(err.exit_code(), 1);
    assert!(f.host.calls().is_empty());
}

// ---------------------------------------------------------------------------
// 2. uninstall
// ---------------------------------------------------------------------------

#[test]
fn uninstall_after_install_restores_the_host() {
    let f = fixture();
    fs::create_dir_all(&f.config.unit_dir).expect("mkdir units");
    fs::create_dir_all(&f.config.policy_dir).expect("mkdir policies");
    fs::write(f.config.unit_dir.join("bluetooth.service"), "[Unit]\n").expect("seed unit");
    fs::write(f.config.policy_dir.join("bluetooth.conf"), "<busconfig/>\n").expect("seed policy");

    let units = snapshot(&f.config.unit_dir);
    let policies = snapshot(&f.config.policy_dir);
    let packages = installed_packages(&f);

    lifecycle(&f).install().expect("install");
    f.host.clear_calls();
    let report = lifecycle(&f).uninstall().expect("uninstall");

    assert_eq!(report.found(), Found::Installed);
    assert_eq!(snapshot(&f.config.unit_dir), units);
    assert_eq!(snapshot(&f.config.policy_dir), policies);
    assert_eq!(installed_packages(&f), packages);
    assert!(!f.host.is_enabled(UNIT) && !f.host.is_active(UNIT));

    assert!(position(&f, "systemctl disable") < position(&f, "systemctl stop"));
    assert!(position(&f, "systemctl stop") < position(&f, "systemctl daemon-reload"));
    assert!(position(&f, "systemctl daemon-reload") < position(&f, "pipx uninstall"));

    let status = lifecycle(&f).status().expect("status");
    assert!(status.is_absent(), "{status:?}");
}

#[test]
fn uninstall_on_never_installed_host_succeeds() {
    let f = fixture();
    let report = lifecycle(&f).uninstall().expect("uninstall");

    assert!(report.service.is_absent());
    assert!(report.package.is_absent());
    assert_eq!(report.found(), Found::NeverInstalled);
    assert!(f.host.calls_to("pipx").iter().all(|c| c.starts_with("list")));
}

#[test]
fn uninstall_twice_never_errors() {
    let f = fixture();
    lifecycle(&f).install().expect("install");
    lifecycle(&f).uninstall().expect("first");
    let second = lifecycle(&f).uninstall().expect("second");
    assert_eq!(second.found(), Found::NeverInstalled);
}

#[test]
fn uninstall_with_package_removed_by_hand_is_partial() {
    let f = fixture();
    lifecycle(&f).install().expect("install");
    lifecycle(&f).uninstall_bin().expect("remove package only");

    let report = lifecycle(&f).uninstall().expect("uninstall");
    assert!(matches!(report.service, Removal::Removed(_)));
    assert!(report.package.is_absent());
    assert_eq!(report.found(), Found::Partial);
    assert!(!f.config.unit_path().exists());
}

#[test]
fn uninstall_stops_at_a_failing_service_step() {
    let f = fixture();
    lifecycle(&f).install().expect("install");
    f.host.fail_on("systemctl stop");

    let err = lifecycle(&f).uninstall().unwrap_err();
    assert_eq!(err.exit_code(), 25);
    assert!(f.host.calls_to("pipx").iter().all(|c| !c.starts_with("uninstall")));
    assert_eq!(installed_packages(&f).lines().count(), 1);
}

#[test]
fn uninstall_bin_reports_package_removal_failure() {
    let f = fixture();
    lifecycle(&f).install_bin().expect("install-bin");
    f.host.fail_on("pipx uninstall");

    let err = lifecycle(&f).uninstall_bin().unwrap_err();
    assert_eq!(err.exit_code(), 11);
}

// ---------------------------------------------------------------------------
// 3. single stages, status, diff
// ---------------------------------------------------------------------------

#[test]
fn single_stages_compose_like_install() {
    let f = fixture();
    lifecycle(&f).install_bin().expect("install-bin");
    assert!(f.host.calls_to("systemctl").is_empty());

    lifecycle(&f).install_systemd().expect("install-systemd");
    let status = lifecycle(&f).status().expect("status");
    assert!(status.is_installed(), "{status:?}");

    assert!(matches!(
        lifecycle(&f).uninstall_systemd().expect("uninstall-systemd"),
        Removal::Removed(_)
    ));
    let status = lifecycle(&f).status().expect("status");
    assert!(status.package_installed);
    assert_eq!(status.state, UnitState::Absent);

    assert!(lifecycle(&f).uninstall_systemd().expect("again").is_absent());
}

#[test]
fn status_on_clean_host_is_absent() {
    let f = fixture();
    let status = lifecycle(&f).status().expect("status");
    assert!(status.is_absent());
    assert_eq!(status.entry_point, None);
    assert_eq!(status.service, UNIT);

    let json = serde_json::to_value(&status).expect("serialize");
    assert_eq!(json["state"], "absent");
    assert_eq!(json["package"], "a2dp-agent");
}

#[test]
fn diff_reports_pending_changes_and_writes_nothing() {
    let f = fixture();
    let pending = lifecycle(&f).diff().expect("diff");
    assert_eq!(pending.len(), 2);
    assert!(!f.config.unit_path().exists());

    lifecycle(&f).install().expect("install");
    assert!(lifecycle(&f).diff().expect("diff").is_empty());
}
