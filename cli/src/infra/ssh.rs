//! Infrastructure implementation of the transport ports over OpenSSH.
//!
//! `SshTransport<R>` routes every remote call through `ssh` and file
//! delivery through `scp`, both spawned via a `CommandRunner`. Host keys are
//! trusted on first use and pinned in the user's `known_hosts` afterwards.

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, FileTransfer, RemoteShell};
use crate::domain::shell;
use crate::domain::target::DeployTarget;
use crate::infra::command_runner::TokioCommandRunner;

/// Seconds ssh waits for the TCP connection before giving up.
pub const CONNECT_TIMEOUT_SECS: u32 = 15;

/// Infrastructure adapter that reaches the deploy target through `ssh`/`scp`.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct SshTransport<R: CommandRunner> {
    runner: R,
    target: DeployTarget,
}

impl<R: CommandRunner> SshTransport<R> {
    pub fn new(runner: R, target: DeployTarget) -> Self {
        Self { runner, target }
    }

    #[must_use]
    pub fn target(&self) -> &DeployTarget {
        &self.target
    }

    /// Options shared by `ssh` and `scp`.
    fn common_options(&self) -> Vec<String> {
        let mut opts = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"),
        ];
        if let Some(identity) = &self.target.identity_file {
            opts.push("-i".to_string());
            opts.push(identity.display().to_string());
        }
        opts
    }

    /// Full `ssh` argument list for running `args` remotely.
    ///
    /// The remote side receives a single shell-quoted command line, so
    /// arguments containing spaces or quotes survive the remote shell.
    #[must_use]
    pub fn ssh_args(&self, args: &[&str]) -> Vec<String> {
        let mut out = self.common_options();
        out.push("-p".to_string());
        out.push(self.target.port.to_string());
        out.push(self.target.destination());
        out.push(shell::join(args));
        out
    }

    /// Full `scp` argument list for copying `local` to `remote`.
    #[must_use]
    pub fn scp_args(&self, local: &Path, remote: &str) -> Vec<String> {
        let mut out = self.common_options();
        out.push("-P".to_string());
        out.push(self.target.port.to_string());
        out.push(local.display().to_string());
        out.push(format!("{}:{remote}", self.target.destination()));
        out
    }
}

impl SshTransport<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(target: DeployTarget) -> Self {
        Self::new(TokioCommandRunner::default(), target)
    }
}

impl<R: CommandRunner> RemoteShell for SshTransport<R> {
    async fn exec(&self, args: &[&str]) -> Result<Output> {
        let argv = self.ssh_args(args);
        let refs: Vec<&str> = argv.iter().map(String::as_str).collect();
        self.runner
            .run("ssh", &refs)
            .await
            .with_context(|| format!("ssh {}", self.target.destination()))
    }

    async fn exec_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<Output> {
        let argv = self.ssh_args(args);
        let refs: Vec<&str> = argv.iter().map(String::as_str).collect();
        self.runner
            .run_with_stdin("ssh", &refs, input)
            .await
            .with_context(|| format!("ssh {}", self.target.destination()))
    }

    fn host(&self) -> &str {
        &self.target.host
    }
}

impl<R: CommandRunner> FileTransfer for SshTransport<R> {
    async fn upload(&self, local: &Path, remote: &str) -> Result<Output> {
        let argv = self.scp_args(local, remote);
        let refs: Vec<&str> = argv.iter().map(String::as_str).collect();
        self.runner
            .run("scp", &refs)
            .await
            .with_context(|| format!("scp {} to {}", local.display(), self.target.host))
    }
}
