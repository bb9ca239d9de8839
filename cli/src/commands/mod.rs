//! Command implementations

pub mod boot;
pub mod bundle;
pub mod config;
pub mod deploy;
pub mod plan;
pub mod status;
pub mod version;
