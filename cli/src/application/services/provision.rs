//! Provisioner: executes the planned convergence steps against the host.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Step selection is delegated to [`crate::domain::plan::plan`]; this module
//! only issues the commands for the steps that survive planning.

use std::process::Output;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::ports::{ProgressReporter, ServiceManager, Transport};
use crate::domain::bundle::Bundle;
use crate::domain::error::DeployError;
use crate::domain::plan::{self, ProvisionStep};
use crate::domain::remote_state::RemoteState;
use crate::domain::secrets::SecretSet;
use crate::domain::target::RemoteLayout;
use crate::domain::unit::ServiceUnitSpec;

/// Writes stdin to `$1` with owner-only permissions.
const WRITE_PRIVATE: &str = "umask 077 && cat > \"$1\"";
/// Writes stdin to `$1` world-readable.
const WRITE_PUBLIC: &str = "umask 022 && cat > \"$1\"";

/// Everything the Provisioner consumes besides the probed state.
pub struct ProvisionInputs<'a> {
    pub layout: &'a RemoteLayout,
    pub bundle: &'a Bundle,
    pub secrets: &'a SecretSet,
    pub unit: &'a ServiceUnitSpec,
}

/// Outcome of a successful provisioning pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub executed: Vec<ProvisionStep>,
    pub skipped: Vec<ProvisionStep>,
    pub final_state: RemoteState,
}

/// Converge the host from `state` by running `plan(state)` in order.
///
/// # Errors
///
/// Returns [`DeployError::ProvisioningStep`] naming the first step that
/// failed. Steps after it are not attempted and completed steps are not
/// undone.
#[instrument(skip_all, fields(host = transport.host(), unit = %inputs.layout.unit_name))]
pub async fn provision(
    transport: &impl Transport,
    services: &impl ServiceManager,
    inputs: &ProvisionInputs<'_>,
    state: &RemoteState,
    reporter: &impl ProgressReporter,
) -> Result<ProvisionReport, DeployError> {
    let steps = plan::plan(state);
    let skipped = plan::skipped(state);
    for step in &skipped {
        debug!(%step, "already satisfied");
    }

    let mut current = *state;
    for &step in &steps {
        let label = format!("[{}/7] {}", step.number(), step.describe());
        reporter.step(&format!("{label}..."));
        run_step(step, transport, services, inputs)
            .await
            .map_err(|e| DeployError::ProvisioningStep {
                step,
                cause: format!("{e:#}"),
            })?;
        current = step.apply_to(current);
        info!(%step, "step complete");
        reporter.success(&label);
    }

    Ok(ProvisionReport {
        executed: steps,
        skipped,
        final_state: current,
    })
}

async fn run_step(
    step: ProvisionStep,
    transport: &impl Transport,
    services: &impl ServiceManager,
    inputs: &ProvisionInputs<'_>,
) -> Result<()> {
    let layout = inputs.layout;
    match step {
        ProvisionStep::EnsureBaseDir => {
            let out = transport.exec(&["mkdir", "-p", &layout.base_dir]).await?;
            ensure_ok(&out, "mkdir")
        }
        ProvisionStep::UnpackBundle => unpack_bundle(transport, layout, inputs.bundle).await,
        ProvisionStep::EnsureRuntimeEnv => {
            let out = transport
                .exec(&["python3", "-m", "venv", &layout.runtime_env])
                .await?;
            ensure_ok(&out, "python3 -m venv")
        }
        ProvisionStep::InstallDependencies => {
            let pip = layout.pip();
            let out = transport
                .exec(&[&pip, "install", "-r", &layout.requirements])
                .await?;
            ensure_ok(&out, "pip install")
        }
        ProvisionStep::WriteSecrets => {
            let body = inputs.secrets.render_env_file();
            let out = transport
                .exec_with_stdin(&["sh", "-c", WRITE_PRIVATE, "sh", &layout.env_file], body.as_bytes())
                .await?;
            ensure_ok(&out, "write env file")
        }
        ProvisionStep::EnsureDataFile => {
            let out = transport.exec(&["touch", &layout.data_file]).await?;
            ensure_ok(&out, "touch")
        }
        ProvisionStep::InstallUnit => install_unit(transport, services, layout, inputs.unit).await,
    }
}

async fn unpack_bundle(
    transport: &impl Transport,
    layout: &RemoteLayout,
    bundle: &Bundle,
) -> Result<()> {
    let out = transport
        .upload(&bundle.archive, &layout.upload_path)
        .await
        .context("uploading bundle")?;
    ensure_ok(&out, "upload")?;

    let out = transport
        .exec(&["tar", "-xzf", &layout.upload_path, "-C", &layout.base_dir])
        .await?;
    ensure_ok(&out, "tar -xzf")?;

    let out = transport.exec(&["rm", "-f", &layout.upload_path]).await?;
    ensure_ok(&out, "removing uploaded archive")
}

async fn install_unit(
    transport: &impl Transport,
    services: &impl ServiceManager,
    layout: &RemoteLayout,
    unit: &ServiceUnitSpec,
) -> Result<()> {
    let text = unit.render();
    let out = transport
        .exec_with_stdin(
            &["sudo", "sh", "-c", WRITE_PUBLIC, "sh", &layout.unit_file],
            text.as_bytes(),
        )
        .await?;
    ensure_ok(&out, "write unit file")?;

    let out = services.daemon_reload().await?;
    ensure_ok(&out, "systemctl daemon-reload")?;

    let out = services.enable(&layout.unit_name).await?;
    ensure_ok(&out, "systemctl enable")
}

/// Turn a non-zero exit into an error carrying the trimmed stderr.
fn ensure_ok(output: &Output, what: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    bail!("{what} exited with {code}: {}", stderr.trim())
}
