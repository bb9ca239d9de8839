//! Deploy target and the remote filesystem layout derived from it.

use std::path::PathBuf;

use serde::Serialize;

/// Default ssh port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Where convergence happens. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployTarget {
    pub host: String,
    /// Login identity on the remote host.
    pub user: String,
    /// Absolute remote directory holding the application.
    pub base_dir: String,
    pub port: u16,
    /// Private key passed to ssh with `-i`.
    pub identity_file: Option<PathBuf>,
}

impl DeployTarget {
    /// `user@host` as accepted by ssh and scp.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// Absolute remote paths for every resource the Provisioner manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteLayout {
    pub base_dir: String,
    pub runtime_env: String,
    pub env_file: String,
    pub data_file: String,
    pub requirements: String,
    pub unit_name: String,
    pub unit_file: String,
    /// Where the bundle archive is uploaded before unpacking.
    pub upload_path: String,
}

/// Directory systemd loads administrator-installed units from.
pub const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

impl RemoteLayout {
    /// Derive the layout from the target base directory and the file names
    /// chosen in configuration.
    #[must_use]
    pub fn new(
        target: &DeployTarget,
        runtime_env: &str,
        env_file: &str,
        data_file: &str,
        requirements: &str,
        unit_name: &str,
    ) -> Self {
        let base = target.base_dir.trim_end_matches('/');
        let join = |name: &str| format!("{base}/{name}");
        Self {
            base_dir: base.to_string(),
            runtime_env: join(runtime_env),
            env_file: join(env_file),
            data_file: join(data_file),
            requirements: join(requirements),
            unit_name: unit_name.to_string(),
            unit_file: format!("{SYSTEMD_UNIT_DIR}/{unit_name}.service"),
            upload_path: format!("/tmp/{unit_name}-bundle.tar.gz"),
        }
    }

    /// `pip` inside the runtime environment.
    #[must_use]
    pub fn pip(&self) -> String {
        format!("{}/bin/pip", self.runtime_env)
    }
}
