//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod boot;
pub mod deploy;
pub mod lifecycle;
pub mod probe;
pub mod provision;

#[cfg(test)]
pub(crate) mod test_support;
