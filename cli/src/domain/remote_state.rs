//! Snapshot of what already exists on the deploy target.

use serde::Serialize;

/// Result of one probe of the remote host.
///
/// Never persisted: recomputed on every run. Each flag reflects what the host
/// reported at probe time; it may be stale by the time a step acts on it,
/// which is acceptable because every step is safe to repeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemoteState {
    pub directory_exists: bool,
    pub runtime_env_exists: bool,
    pub service_unit_installed: bool,
    pub secrets_file_exists: bool,
    pub data_file_exists: bool,
}

impl RemoteState {
    /// A host with nothing installed.
    #[must_use]
    pub fn fresh() -> Self {
        Self::default()
    }

    /// A host where every create-if-absent resource already exists.
    #[must_use]
    pub fn provisioned() -> Self {
        Self {
            directory_exists: true,
            runtime_env_exists: true,
            service_unit_installed: true,
            secrets_file_exists: true,
            data_file_exists: true,
        }
    }

    /// Rows for tabular rendering, in probe order.
    #[must_use]
    pub fn rows(&self) -> [(&'static str, bool); 5] {
        [
            ("base directory", self.directory_exists),
            ("runtime environment", self.runtime_env_exists),
            ("service unit", self.service_unit_installed),
            ("secrets file", self.secrets_file_exists),
            ("data file", self.data_file_exists),
        ]
    }
}
