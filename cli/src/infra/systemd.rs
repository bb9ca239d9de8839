//! Infrastructure implementation of the `ServiceManager` port via `systemctl`.
//!
//! `Systemd<S>` issues `systemctl` through any `RemoteShell`: the ssh
//! transport during a deploy, or `LocalShell` when the boot assertion runs
//! on the host itself.

use std::process::Output;

use anyhow::{Result, bail};

use crate::application::ports::{CommandRunner, RemoteShell, ServiceManager};

/// Adapter that maps service-manager calls onto `systemctl`.
pub struct Systemd<'a, S: RemoteShell> {
    shell: &'a S,
    /// Prefix mutating calls with `sudo`.
    sudo: bool,
}

impl<'a, S: RemoteShell> Systemd<'a, S> {
    /// Manager that escalates with `sudo` (deploy user over ssh).
    pub fn with_sudo(shell: &'a S) -> Self {
        Self { shell, sudo: true }
    }

    /// Manager that runs `systemctl` directly (already root at boot).
    pub fn direct(shell: &'a S) -> Self {
        Self { shell, sudo: false }
    }

    async fn mutate(&self, verb: &str, unit: Option<&str>) -> Result<Output> {
        let mut args = Vec::with_capacity(4);
        if self.sudo {
            args.push("sudo");
        }
        args.push("systemctl");
        args.push(verb);
        if let Some(unit) = unit {
            args.push(unit);
        }
        self.shell.exec(&args).await
    }
}

impl<S: RemoteShell> ServiceManager for Systemd<'_, S> {
    async fn daemon_reload(&self) -> Result<Output> {
        self.mutate("daemon-reload", None).await
    }

    async fn enable(&self, unit: &str) -> Result<Output> {
        self.mutate("enable", Some(unit)).await
    }

    async fn start(&self, unit: &str) -> Result<Output> {
        self.mutate("start", Some(unit)).await
    }

    async fn restart(&self, unit: &str) -> Result<Output> {
        self.mutate("restart", Some(unit)).await
    }

    async fn status(&self, unit: &str) -> Result<Output> {
        self.shell
            .exec(&["systemctl", "status", unit, "--no-pager"])
            .await
    }
}

/// `RemoteShell` over local processes, used when convoy runs on the host.
pub struct LocalShell<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> LocalShell<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> RemoteShell for LocalShell<R> {
    async fn exec(&self, args: &[&str]) -> Result<Output> {
        let Some((program, rest)) = args.split_first() else {
            bail!("empty command");
        };
        self.runner.run(program, rest).await
    }

    async fn exec_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<Output> {
        let Some((program, rest)) = args.split_first() else {
            bail!("empty command");
        };
        self.runner.run_with_stdin(program, rest, input).await
    }

    fn host(&self) -> &str {
        "localhost"
    }
}
