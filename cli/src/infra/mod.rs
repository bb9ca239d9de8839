//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, ssh and
//! scp, systemd, archive packing, configuration and secret loading, the boot
//! log and logging setup.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod boot_log;
pub mod bundle;
pub mod command_runner;
pub mod config;
pub mod logging;
pub mod secrets;
pub mod ssh;
pub mod systemd;
