//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod boot;
pub mod bundle;
pub mod config;
pub mod error;
pub mod plan;
pub mod remote_state;
pub mod secrets;
pub mod shell;
pub mod target;
pub mod unit;

pub use config::DeployConfig;
pub use error::{ConfigError, DeployError};
pub use plan::{ProvisionStep, StepPolicy};
pub use remote_state::RemoteState;
pub use secrets::SecretSet;
pub use target::{DeployTarget, RemoteLayout};
pub use unit::ServiceUnitSpec;
