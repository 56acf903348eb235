//! Unit and policy descriptor rendering.
//!
//! Both descriptors are tera templates baked into the binary; a config may
//! point either one at a file on disk instead. The rendered text is the
//! "source" copy the installed descriptor must match byte for byte.

use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use a2dp_core::InstallConfig;

use crate::error::ServiceError;

const UNIT_TEMPLATE: &str = include_str!("templates/unit.service.tera");
const POLICY_TEMPLATE: &str = include_str!("templates/policy.conf.tera");

const UNIT_NAME: &str = "unit.service.tera";
const POLICY_NAME: &str = "policy.conf.tera";

/// Rendering payload shared by both templates.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorContext {
    pub service: String,
    pub unit: String,
    pub package: String,
    pub description: String,
    pub exec_start: String,
    pub device: String,
    pub agent_verbose: bool,
    pub user: Option<String>,
    /// `user`, or `root` when the agent runs as root.
    pub policy_user: String,
}

impl DescriptorContext {
    pub fn new(config: &InstallConfig, entry_point: &Path) -> Self {
        Self {
            service: config.service.0.clone(),
            unit: config.service.unit_file_name(),
            package: config.package.0.clone(),
            description: format!("A2DP Bluetooth agent on {}", config.device),
            exec_start: exec_start(entry_point, &config.device, config.agent_verbose),
            device: config.device.clone(),
            agent_verbose: config.agent_verbose,
            user: config.user.clone(),
            policy_user: config.user.clone().unwrap_or_else(|| "root".to_string()),
        }
    }
}

/// Rendered descriptor contents, ready to be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub unit: String,
    pub policy: String,
}

/// `ExecStart=` value: `<entry point> [--verbose] <device>`.
///
/// systemd splits on whitespace, so a path containing spaces is quoted.
pub fn exec_start(entry_point: &Path, device: &str, verbose: bool) -> String {
    let binary = entry_point.display().to_string();
    let mut line = if binary.chars().any(char::is_whitespace) {
        format!("\"{binary}\"")
    } else {
        binary
    };
    if verbose {
        line.push_str(" --verbose");
    }
    line.push(' ');
    line.push_str(device);
    line
}

fn template_source(
    override_path: Option<&Path>,
    embedded: &'static str,
) -> Result<String, ServiceError> {
    match override_path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| ServiceError::Template {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(embedded.to_string()),
    }
}

fn build_tera(config: &InstallConfig) -> Result<Tera, ServiceError> {
    let unit = template_source(config.unit_template.as_deref(), UNIT_TEMPLATE)?;
    let policy = template_source(config.policy_template.as_deref(), POLICY_TEMPLATE)?;

    let mut tera = Tera::default();
    tera.add_raw_template(UNIT_NAME, &unit)
        .map_err(|source| ServiceError::Render { name: UNIT_NAME, source })?;
    tera.add_raw_template(POLICY_NAME, &policy)
        .map_err(|source| ServiceError::Render { name: POLICY_NAME, source })?;
    Ok(tera)
}

/// Render both descriptors for `entry_point`.
pub fn render(config: &InstallConfig, entry_point: &Path) -> Result<Rendered, ServiceError> {
    let tera = build_tera(config)?;
    let ctx = Context::from_serialize(DescriptorContext::new(config, entry_point))
        .map_err(|source| ServiceError::Render { name: UNIT_NAME, source })?;

    let unit = tera
        .render(UNIT_NAME, &ctx)
        .map_err(|source| ServiceError::Render { name: UNIT_NAME, source })?;
    let policy = tera
        .render(POLICY_NAME, &ctx)
        .map_err(|source| ServiceError::Render { name: POLICY_NAME, source })?;

    Ok(Rendered { unit, policy })
}
