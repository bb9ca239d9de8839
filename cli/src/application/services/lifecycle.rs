//! Service lifecycle: restart after provisioning and report status.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::process::Output;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::application::ports::ServiceManager;
use crate::domain::error::DeployError;

/// Text systemd prints when the restart job was queued but the unit then
/// failed to come up.
const JOB_FAILED: &str = "Job for";

/// Result of [`restart_and_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleReport {
    /// `systemctl status` text.
    pub status: String,
    /// `true` when the manager reports the unit active after the restart.
    pub active: bool,
    /// Set when the restart was accepted but the start job failed.
    pub restart_warning: Option<String>,
}

/// Restart `unit` unconditionally, then return its status text.
///
/// A restart the manager accepted counts as success even if the process
/// then fails to start; that outcome is surfaced in
/// [`LifecycleReport::restart_warning`] and the status text.
///
/// # Errors
///
/// Returns [`DeployError::ServiceControl`] if the restart command cannot be
/// issued or the manager rejects it (unit missing, access denied).
#[instrument(skip(services))]
pub async fn restart_and_report(
    services: &impl ServiceManager,
    unit: &str,
) -> Result<LifecycleReport, DeployError> {
    let out = services
        .restart(unit)
        .await
        .map_err(|e| control_error(unit, &format!("{e:#}")))?;

    let restart_warning = if out.status.success() {
        info!("restart accepted");
        None
    } else {
        let stderr = stderr_of(&out);
        if !stderr.contains(JOB_FAILED) {
            return Err(control_error(unit, &stderr));
        }
        warn!(%stderr, "restart accepted but start job failed");
        Some(stderr)
    };

    let (status, active) = status(services, unit).await?;
    Ok(LifecycleReport {
        status,
        active,
        restart_warning,
    })
}

/// Status text for `unit` and whether it is active.
///
/// A non-zero `status` exit (inactive, failed, unknown unit) is not an error:
/// its text is returned as-is.
///
/// # Errors
///
/// Returns [`DeployError::ServiceControl`] only if the query cannot be issued.
pub async fn status(services: &impl ServiceManager, unit: &str) -> Result<(String, bool), DeployError> {
    let out = services
        .status(unit)
        .await
        .map_err(|e| control_error(unit, &format!("{e:#}")))?;
    let mut text = String::from_utf8_lossy(&out.stdout).trim_end().to_string();
    if text.is_empty() {
        text = stderr_of(&out);
    }
    Ok((text, out.status.success()))
}

fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).trim().to_string()
}

fn control_error(unit: &str, cause: &str) -> DeployError {
    DeployError::ServiceControl {
        unit: unit.to_string(),
        cause: cause.to_string(),
    }
}
