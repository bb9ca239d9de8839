//! Unit and property tests for `SshTransport` and `Systemd`.
//!
//! These tests verify the `ssh`/`scp` argument lists built for each remote
//! call, that error context names the destination, and that `Systemd`
//! escalates mutating calls only when asked to.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use convoy_cli::application::ports::{CommandRunner, FileTransfer, RemoteShell, ServiceManager};
use convoy_cli::domain::target::DeployTarget;
use convoy_cli::infra::ssh::SshTransport;
use convoy_cli::infra::systemd::Systemd;
use proptest::prelude::*;

use crate::mocks::ok_output;

// ─── MockCommandRunner ────────────────────────────────────────────────────────

/// A `CommandRunner` that records every `(program, args, stdin)` call and
/// returns a configurable canned result.
#[derive(Clone)]
struct MockCommandRunner {
    calls: Arc<Mutex<Vec<(String, Vec<String>, Option<Vec<u8>>)>>>,
    result: Arc<dyn Fn() -> Result<Output> + Send + Sync>,
}

impl MockCommandRunner {
    fn new_ok() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: Arc::new(|| Ok(ok_output(b""))),
        }
    }

    fn new_err(msg: &'static str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: Arc::new(move || bail!("{msg}")),
        }
    }

    fn recorded_calls(&self) -> Vec<(String, Vec<String>, Option<Vec<u8>>)> {
        self.calls.lock().expect("mutex poisoned").clone()
    }

    fn record(&self, program: &str, args: &[&str], stdin: Option<&[u8]>) -> Result<Output> {
        self.calls.lock().expect("mutex poisoned").push((
            program.to_owned(),
            args.iter().map(|s| (*s).to_string()).collect(),
            stdin.map(<[u8]>::to_vec),
        ));
        (self.result)()
    }
}

impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.record(program, args, None)
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.record(program, args, None)
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        self.record(program, args, Some(input))
    }
}

fn target() -> DeployTarget {
    DeployTarget {
        host: "10.0.0.4".into(),
        user: "azureuser".into(),
        base_dir: "/home/azureuser/qgen".into(),
        port: 22,
        identity_file: None,
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}

// ─── ssh ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn exec_builds_ssh_invocation_with_batch_options() {
    let runner = MockCommandRunner::new_ok();
    let transport = SshTransport::new(runner.clone(), target());

    transport
        .exec(&["test", "-d", "/home/azureuser/qgen"])
        .await
        .expect("exec");

    let calls = runner.recorded_calls();
    assert_eq!(calls.len(), 1);
    let (program, args, stdin) = &calls[0];
    assert_eq!(program, "ssh");
    assert_eq!(
        args,
        &strings(&[
            "-o",
            "StrictHostKeyChecking=accept-new",
            "-o",
            "BatchMode=yes",
            "-o",
            "ConnectTimeout=15",
            "-p",
            "22",
            "azureuser@10.0.0.4",
            "test -d /home/azureuser/qgen",
        ])
    );
    assert!(stdin.is_none());
}

#[tokio::test]
async fn exec_quotes_arguments_for_the_remote_shell() {
    let runner = MockCommandRunner::new_ok();
    let transport = SshTransport::new(runner.clone(), target());

    transport
        .exec(&["sh", "-c", "umask 077 && cat > \"$1\"", "sh", "/srv/my app/.env"])
        .await
        .expect("exec");

    let (_, args, _) = &runner.recorded_calls()[0];
    assert_eq!(
        args.last().map(String::as_str),
        Some(r#"sh -c 'umask 077 && cat > "$1"' sh '/srv/my app/.env'"#)
    );
}

#[tokio::test]
async fn exec_with_stdin_forwards_payload() {
    let runner = MockCommandRunner::new_ok();
    let transport = SshTransport::new(runner.clone(), target());

    transport
        .exec_with_stdin(&["cat"], b"GOOGLE_API_KEY=k1\n")
        .await
        .expect("exec_with_stdin");

    let (program, _, stdin) = &runner.recorded_calls()[0];
    assert_eq!(program, "ssh");
    assert_eq!(stdin.as_deref(), Some(b"GOOGLE_API_KEY=k1\n".as_slice()));
}

#[tokio::test]
async fn identity_and_port_are_passed_through() {
    let runner = MockCommandRunner::new_ok();
    let mut t = target();
    t.port = 2222;
    t.identity_file = Some(PathBuf::from("/home/dev/.ssh/deploy_ed25519"));
    let transport = SshTransport::new(runner.clone(), t);

    transport.exec(&["true"]).await.expect("exec");

    let (_, args, _) = &runner.recorded_calls()[0];
    let joined = args.join(" ");
    assert!(joined.contains("-i /home/dev/.ssh/deploy_ed25519"), "{joined}");
    assert!(joined.contains("-p 2222"), "{joined}");
}

#[tokio::test]
async fn exec_error_names_destination() {
    let runner = MockCommandRunner::new_err("failed to run ssh");
    let transport = SshTransport::new(runner, target());

    let err = transport.exec(&["true"]).await.expect_err("should fail");
    let msg = format!("{err:#}");
    assert!(msg.contains("azureuser@10.0.0.4"), "{msg}");
    assert!(msg.contains("failed to run ssh"), "{msg}");
}

#[test]
fn host_is_target_host() {
    let transport = SshTransport::new(MockCommandRunner::new_ok(), target());
    assert_eq!(transport.host(), "10.0.0.4");
}

// ─── scp ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_builds_scp_invocation() {
    let runner = MockCommandRunner::new_ok();
    let mut t = target();
    t.port = 2222;
    let transport = SshTransport::new(runner.clone(), t);

    transport
        .upload(Path::new("/tmp/work/bundle.tar.gz"), "/tmp/qgen-bundle.tar.gz")
        .await
        .expect("upload");

    let (program, args, _) = &runner.recorded_calls()[0];
    assert_eq!(program, "scp");
    let tail: Vec<&str> = args.iter().rev().take(4).rev().map(String::as_str).collect();
    assert_eq!(
        tail,
        vec![
            "-P",
            "2222",
            "/tmp/work/bundle.tar.gz",
            "azureuser@10.0.0.4:/tmp/qgen-bundle.tar.gz",
        ]
    );
}

#[tokio::test]
async fn upload_error_names_file_and_host() {
    let runner = MockCommandRunner::new_err("connection closed");
    let transport = SshTransport::new(runner, target());

    let err = transport
        .upload(Path::new("/tmp/work/bundle.tar.gz"), "/tmp/x")
        .await
        .expect_err("should fail");
    let msg = format!("{err:#}");
    assert!(msg.contains("bundle.tar.gz"), "{msg}");
    assert!(msg.contains("10.0.0.4"), "{msg}");
}

// ─── systemd ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn systemd_with_sudo_escalates_mutations_but_not_status() {
    let runner = MockCommandRunner::new_ok();
    let transport = SshTransport::new(runner.clone(), target());
    let services = Systemd::with_sudo(&transport);

    services.daemon_reload().await.expect("reload");
    services.enable("qgen").await.expect("enable");
    services.restart("qgen").await.expect("restart");
    services.status("qgen").await.expect("status");

    let remote: Vec<String> = runner
        .recorded_calls()
        .into_iter()
        .filter_map(|(_, args, _)| args.last().cloned())
        .collect();
    assert_eq!(
        remote,
        vec![
            "sudo systemctl daemon-reload",
            "sudo systemctl enable qgen",
            "sudo systemctl restart qgen",
            "systemctl status qgen --no-pager",
        ]
    );
}

#[tokio::test]
async fn systemd_direct_runs_without_sudo() {
    let runner = MockCommandRunner::new_ok();
    let transport = SshTransport::new(runner.clone(), target());
    let services = Systemd::direct(&transport);

    services.start("qgen").await.expect("start");

    let (_, args, _) = &runner.recorded_calls()[0];
    assert_eq!(args.last().map(String::as_str), Some("systemctl start qgen"));
}

// ─── Properties ───────────────────────────────────────────────────────────────

proptest! {
    /// The remote command is always the final argument, after the destination.
    #[test]
    fn prop_remote_command_is_last(
        user in "[a-z][a-z0-9]{0,7}",
        host in "[a-z][a-z0-9.-]{0,15}",
        port in 1u16..,
    ) {
        let t = DeployTarget {
            host: host.clone(),
            user: user.clone(),
            base_dir: "/srv/app".into(),
            port,
            identity_file: None,
        };
        let transport = SshTransport::new(MockCommandRunner::new_ok(), t);
        let args = transport.ssh_args(&["systemctl", "is-active", "qgen"]);
        prop_assert_eq!(args.last().map(String::as_str), Some("systemctl is-active qgen"));
        prop_assert_eq!(&args[args.len() - 2], &format!("{user}@{host}"));
        let port_str = port.to_string();
        prop_assert!(args.windows(2).any(|w| w[0] == "-p" && w[1] == port_str));
    }
}
