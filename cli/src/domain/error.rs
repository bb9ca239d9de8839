//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator, so callers can recover them with `downcast_ref`.

use thiserror::Error;

use crate::domain::plan::ProvisionStep;

// ── Deploy errors ─────────────────────────────────────────────────────────────

/// Every way a deploy run can abort. Each variant stops the run immediately.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing or invalid target/secret configuration. Raised before any
    /// remote action is taken.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("host {host} is unreachable: {cause}")]
    UnreachableHost { host: String, cause: String },

    #[error("permission denied on {host}: {cause}")]
    Permission { host: String, cause: String },

    /// Step `step` of the convergence sequence failed; later steps were not run.
    #[error("step {} ({step}) failed: {cause}", step.number())]
    ProvisioningStep { step: ProvisionStep, cause: String },

    #[error("service control failed for {unit}: {cause}")]
    ServiceControl { unit: String, cause: String },
}

impl DeployError {
    /// Short machine-readable code used by `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::UnreachableHost { .. } => "unreachable_host",
            Self::Permission { .. } => "permission",
            Self::ProvisioningStep { .. } => "provisioning_step",
            Self::ServiceControl { .. } => "service_control",
        }
    }

    /// The failing step, when the error came from the Provisioner.
    #[must_use]
    pub fn failed_step(&self) -> Option<ProvisionStep> {
        match self {
            Self::ProvisioningStep { step, .. } => Some(*step),
            _ => None,
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while validating the configuration file and CLI overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl From<ConfigError> for DeployError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
