//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::boot::BootRecord;
use crate::domain::bundle::Bundle;
use crate::domain::config::DeployConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Transport Ports ───────────────────────────────────────────────────────────

/// Command execution on the deploy target.
///
/// `Err` means the command could not be issued at all (spawn failure,
/// timeout). A command that ran and failed is `Ok` with a non-zero status.
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// Execute `args` on the host and capture output.
    async fn exec(&self, args: &[&str]) -> Result<Output>;
    /// Execute `args` on the host with stdin piped from `input`.
    async fn exec_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<Output>;
    /// Host name used in error messages.
    fn host(&self) -> &str;
}

/// Local-to-host file delivery.
#[allow(async_fn_in_trait)]
pub trait FileTransfer {
    /// Copy a local file to an absolute path on the host.
    async fn upload(&self, local: &Path, remote: &str) -> Result<Output>;
}

/// Composite trait: any type implementing both sub-traits is a `Transport`.
pub trait Transport: RemoteShell + FileTransfer {}

/// Blanket implementation: any type implementing both sub-traits is a `Transport`.
impl<T> Transport for T where T: RemoteShell + FileTransfer {}

// ── Service Manager Port ──────────────────────────────────────────────────────

/// The service-manager contract: reload, enable, start, restart, status.
///
/// Same `Err`/`Ok(non-zero)` split as [`RemoteShell`].
#[allow(async_fn_in_trait)]
pub trait ServiceManager {
    /// Re-read unit definitions from disk.
    async fn daemon_reload(&self) -> Result<Output>;
    async fn enable(&self, unit: &str) -> Result<Output>;
    async fn start(&self, unit: &str) -> Result<Output>;
    async fn restart(&self, unit: &str) -> Result<Output>;
    /// Status text. A non-zero exit (inactive, failed) still carries text.
    async fn status(&self, unit: &str) -> Result<Output>;
}

// ── Bundle Port ───────────────────────────────────────────────────────────────

/// Packs the bundle file set into a single archive.
pub trait BundleArchiver {
    /// Pack `files` (relative to `root`) into an archive under `out_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or the archive cannot be written.
    fn pack(&self, root: &Path, files: &[PathBuf], out_dir: &Path) -> Result<Bundle>;
}

// ── Secret Port ───────────────────────────────────────────────────────────────

/// Key-value secret source consulted once per deploy.
#[cfg_attr(test, mockall::automock)]
pub trait SecretProvider {
    /// Value for `key`, or `None` when unset.
    fn get(&self, key: &str) -> Option<String>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts configuration loading.
pub trait ConfigStore {
    /// Load configuration; a missing file yields defaults.
    fn load(&self) -> Result<DeployConfig>;
    /// Path the configuration is read from.
    fn path(&self) -> Result<PathBuf>;
}

// ── Boot Log Port ─────────────────────────────────────────────────────────────

/// Append-only record of boot-time assertions.
pub trait BootLog {
    /// Append one record.
    fn append(&self, record: &BootRecord) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
