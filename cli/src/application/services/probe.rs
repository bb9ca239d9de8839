//! Remote state probing: read-only existence checks on the deploy target.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::process::Output;

use tracing::{debug, instrument};

use crate::application::ports::RemoteShell;
use crate::domain::error::DeployError;
use crate::domain::remote_state::RemoteState;
use crate::domain::target::RemoteLayout;

/// ssh exits 255 when it cannot connect or authenticate.
const SSH_FAILURE: i32 = 255;

/// Probe the host and return a complete [`RemoteState`].
///
/// Issues only `test` commands. All-or-nothing: the first check that cannot
/// be evaluated aborts the probe and no partial state is returned.
///
/// # Errors
///
/// - [`DeployError::UnreachableHost`] if the transport cannot connect.
/// - [`DeployError::Permission`] if a check cannot run under the login identity.
#[instrument(skip_all, fields(host = shell.host()))]
pub async fn probe(shell: &impl RemoteShell, layout: &RemoteLayout) -> Result<RemoteState, DeployError> {
    let state = RemoteState {
        directory_exists: check(shell, "-d", &layout.base_dir).await?,
        runtime_env_exists: check(shell, "-d", &layout.runtime_env).await?,
        service_unit_installed: check(shell, "-f", &layout.unit_file).await?,
        secrets_file_exists: check(shell, "-f", &layout.env_file).await?,
        data_file_exists: check(shell, "-e", &layout.data_file).await?,
    };
    debug!(?state, "probe complete");
    Ok(state)
}

async fn check(shell: &impl RemoteShell, flag: &str, path: &str) -> Result<bool, DeployError> {
    let output = shell
        .exec(&["test", flag, path])
        .await
        .map_err(|e| DeployError::UnreachableHost {
            host: shell.host().to_string(),
            cause: format!("{e:#}"),
        })?;
    classify(shell.host(), path, &output)
}

/// Map the outcome of one `test` command to a flag or an error.
///
/// # Errors
///
/// Returns [`DeployError::Permission`] or [`DeployError::UnreachableHost`]
/// when the check itself could not be evaluated.
pub fn classify(host: &str, path: &str, output: &Output) -> Result<bool, DeployError> {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains("Permission denied") {
        return Err(DeployError::Permission {
            host: host.to_string(),
            cause: stderr,
        });
    }
    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        Some(SSH_FAILURE) | None => Err(DeployError::UnreachableHost {
            host: host.to_string(),
            cause: if stderr.is_empty() {
                "connection failed".to_string()
            } else {
                stderr
            },
        }),
        Some(code) => Err(DeployError::Permission {
            host: host.to_string(),
            cause: format!("cannot check {path} (exit {code}): {stderr}"),
        }),
    }
}
