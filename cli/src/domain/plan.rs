//! The seven convergence steps and the pure planning function over them.
//!
//! Each step carries its own overwrite policy and precondition, so the
//! create-if-absent vs. always-apply distinction stays per resource:
//!
//! | # | step                   | policy            |
//! |---|------------------------|-------------------|
//! | 1 | `EnsureBaseDir`        | create if absent  |
//! | 2 | `UnpackBundle`         | always            |
//! | 3 | `EnsureRuntimeEnv`     | create if absent  |
//! | 4 | `InstallDependencies`  | always            |
//! | 5 | `WriteSecrets`         | always            |
//! | 6 | `EnsureDataFile`       | create if absent  |
//! | 7 | `InstallUnit`          | create if absent  |

use std::fmt;

use serde::Serialize;

use crate::domain::remote_state::RemoteState;

/// Whether a step is skipped when its resource already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepPolicy {
    /// Run only when the resource is missing; never touch an existing one.
    CreateIfAbsent,
    /// Run on every deploy; the result must reflect the latest inputs.
    Always,
}

/// One convergence step. Ordering of the variants is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvisionStep {
    EnsureBaseDir,
    UnpackBundle,
    EnsureRuntimeEnv,
    InstallDependencies,
    WriteSecrets,
    EnsureDataFile,
    InstallUnit,
}

impl ProvisionStep {
    /// All steps in execution order.
    pub const ALL: [Self; 7] = [
        Self::EnsureBaseDir,
        Self::UnpackBundle,
        Self::EnsureRuntimeEnv,
        Self::InstallDependencies,
        Self::WriteSecrets,
        Self::EnsureDataFile,
        Self::InstallUnit,
    ];

    /// 1-based position in the sequence.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::EnsureBaseDir => 1,
            Self::UnpackBundle => 2,
            Self::EnsureRuntimeEnv => 3,
            Self::InstallDependencies => 4,
            Self::WriteSecrets => 5,
            Self::EnsureDataFile => 6,
            Self::InstallUnit => 7,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::EnsureBaseDir => "ensure-base-dir",
            Self::UnpackBundle => "unpack-bundle",
            Self::EnsureRuntimeEnv => "ensure-runtime-env",
            Self::InstallDependencies => "install-dependencies",
            Self::WriteSecrets => "write-secrets",
            Self::EnsureDataFile => "ensure-data-file",
            Self::InstallUnit => "install-unit",
        }
    }

    /// Human-readable progress label.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::EnsureBaseDir => "creating base directory",
            Self::UnpackBundle => "unpacking bundle",
            Self::EnsureRuntimeEnv => "creating runtime environment",
            Self::InstallDependencies => "installing dependencies",
            Self::WriteSecrets => "writing secrets file",
            Self::EnsureDataFile => "creating data file",
            Self::InstallUnit => "installing service unit",
        }
    }

    #[must_use]
    pub fn policy(self) -> StepPolicy {
        match self {
            Self::UnpackBundle | Self::InstallDependencies | Self::WriteSecrets => {
                StepPolicy::Always
            }
            Self::EnsureBaseDir
            | Self::EnsureRuntimeEnv
            | Self::EnsureDataFile
            | Self::InstallUnit => StepPolicy::CreateIfAbsent,
        }
    }

    /// Returns `true` when `state` already satisfies this step, so it must be
    /// skipped. `Always` steps are never satisfied.
    #[must_use]
    pub fn is_satisfied(self, state: &RemoteState) -> bool {
        match self {
            Self::EnsureBaseDir => state.directory_exists,
            Self::EnsureRuntimeEnv => state.runtime_env_exists,
            Self::EnsureDataFile => state.data_file_exists,
            Self::InstallUnit => state.service_unit_installed,
            Self::UnpackBundle | Self::InstallDependencies | Self::WriteSecrets => false,
        }
    }

    /// State after this step has been applied successfully.
    #[must_use]
    pub fn apply_to(self, mut state: RemoteState) -> RemoteState {
        match self {
            Self::EnsureBaseDir | Self::UnpackBundle => state.directory_exists = true,
            Self::EnsureRuntimeEnv | Self::InstallDependencies => {
                state.runtime_env_exists = true;
            }
            Self::WriteSecrets => state.secrets_file_exists = true,
            Self::EnsureDataFile => state.data_file_exists = true,
            Self::InstallUnit => state.service_unit_installed = true,
        }
        state
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of steps to execute for a probed `state`.
#[must_use]
pub fn plan(state: &RemoteState) -> Vec<ProvisionStep> {
    ProvisionStep::ALL
        .into_iter()
        .filter(|step| !step.is_satisfied(state))
        .collect()
}

/// Steps `plan` leaves out for `state`.
#[must_use]
pub fn skipped(state: &RemoteState) -> Vec<ProvisionStep> {
    ProvisionStep::ALL
        .into_iter()
        .filter(|step| step.is_satisfied(state))
        .collect()
}

/// State expected once every step in `plan(state)` has run.
#[must_use]
pub fn converged(state: &RemoteState) -> RemoteState {
    plan(state)
        .into_iter()
        .fold(*state, |acc, step| step.apply_to(acc))
}
