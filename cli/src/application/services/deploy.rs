//! Application service for the full deploy use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Sequence: resolve secrets, pack bundle, probe, provision, restart.
//! Everything that can fail locally is checked before the first remote
//! command is issued.

use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument};

use crate::application::ports::{
    BundleArchiver, ProgressReporter, SecretProvider, ServiceManager, Transport,
};
use crate::application::services::lifecycle::{self, LifecycleReport};
use crate::application::services::probe::probe;
use crate::application::services::provision::{ProvisionInputs, ProvisionReport, provision};
use crate::domain::config::{DeployConfig, SecretsConfig};
use crate::domain::error::DeployError;
use crate::domain::remote_state::RemoteState;
use crate::domain::secrets::SecretSet;
use crate::domain::target::DeployTarget;

/// Outcome of a successful deploy run.
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    pub host: String,
    pub unit: String,
    pub bundle_sha256: String,
    pub bundle_size: u64,
    pub initial_state: RemoteState,
    pub provision: ProvisionReport,
    pub lifecycle: LifecycleReport,
}

/// Collaborators a deploy run talks to.
pub struct DeployPorts<'a, T, S, A, P> {
    pub transport: &'a T,
    pub services: &'a S,
    pub archiver: &'a A,
    pub secrets: &'a P,
}

/// Resolve every configured secret key from `provider`.
///
/// # Errors
///
/// Returns [`DeployError::Configuration`] if a required key is unset or
/// empty, or if any value contains a line break.
pub fn resolve_secrets(
    config: &SecretsConfig,
    provider: &impl SecretProvider,
) -> Result<SecretSet, DeployError> {
    let mut set = SecretSet::new();
    for key in &config.required {
        match provider.get(key).filter(|v| !v.is_empty()) {
            Some(value) => set.insert(key.as_str(), single_line(key, value)?),
            None => {
                return Err(DeployError::Configuration(format!(
                    "required secret {key} is not set"
                )));
            }
        }
    }
    for key in &config.optional {
        if let Some(value) = provider.get(key).filter(|v| !v.is_empty()) {
            set.insert(key.as_str(), single_line(key, value)?);
        }
    }
    Ok(set)
}

// systemd `EnvironmentFile=` cannot represent a line break inside a value.
fn single_line(key: &str, value: String) -> Result<String, DeployError> {
    if value.contains(['\n', '\r']) {
        return Err(DeployError::Configuration(format!(
            "secret {key} contains a line break"
        )));
    }
    Ok(value)
}

/// Run the whole sequence against `target`.
///
/// `work_dir` receives the local archive; the caller owns its cleanup.
///
/// # Errors
///
/// Returns the first [`DeployError`] encountered; the run stops there.
#[instrument(skip_all, fields(host = %target.host, unit = %config.service.name))]
pub async fn deploy<T, S, A, P>(
    ports: &DeployPorts<'_, T, S, A, P>,
    config: &DeployConfig,
    target: &DeployTarget,
    work_dir: &Path,
    reporter: &impl ProgressReporter,
) -> Result<DeployOutcome, DeployError>
where
    T: Transport,
    S: ServiceManager,
    A: BundleArchiver,
    P: SecretProvider,
{
    config.validate()?;
    let secrets = resolve_secrets(&config.secrets, ports.secrets)?;
    info!(keys = ?secrets.keys(), "secrets resolved");

    reporter.step("building bundle...");
    let bundle = ports
        .archiver
        .pack(&config.bundle.root, &config.bundle.files, work_dir)
        .map_err(|e| DeployError::Configuration(format!("{e:#}")))?;
    info!(sha256 = %bundle.sha256, size = bundle.size, "bundle packed");
    reporter.success(&format!(
        "bundle ready ({} files, {} bytes)",
        bundle.files.len(),
        bundle.size
    ));

    let layout = config.layout(target);
    let unit = config.unit_spec(target, &layout);

    reporter.step(&format!("probing {}...", target.host));
    let initial_state = probe(ports.transport, &layout).await?;

    let inputs = ProvisionInputs {
        layout: &layout,
        bundle: &bundle,
        secrets: &secrets,
        unit: &unit,
    };
    let report = provision(
        ports.transport,
        ports.services,
        &inputs,
        &initial_state,
        reporter,
    )
    .await?;
    reporter.success(&format!(
        "provisioned ({} run, {} skipped)",
        report.executed.len(),
        report.skipped.len()
    ));

    reporter.step(&format!("restarting {}...", layout.unit_name));
    let lifecycle = lifecycle::restart_and_report(ports.services, &layout.unit_name).await?;
    match &lifecycle.restart_warning {
        Some(warning) => reporter.warn(warning),
        None => reporter.success(&format!("{} restarted", layout.unit_name)),
    }

    Ok(DeployOutcome {
        host: target.host.clone(),
        unit: layout.unit_name,
        bundle_sha256: bundle.sha256,
        bundle_size: bundle.size,
        initial_state,
        provision: report,
        lifecycle,
    })
}
