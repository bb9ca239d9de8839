//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` runs local processes (`ssh`, `scp`, `systemctl`)
//! with a hard timeout. On timeout the child is killed explicitly rather than
//! left running behind a dropped future.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, trace};

use crate::application::ports::CommandRunner;

/// Default per-command timeout. Covers `pip install` on a cold cache;
/// connection failures are bounded separately by ssh's `ConnectTimeout`.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(600);

/// Production `CommandRunner` backed by `tokio::process`.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        debug!(program, ?args, "run");
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        wait_with_timeout(child, program, None, timeout).await
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        debug!(program, ?args, stdin_bytes = input.len(), "run with stdin");
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        wait_with_timeout(child, program, Some(input), self.timeout).await
    }
}

/// Feed `input`, drain both pipes and wait, or kill the child after `timeout`.
async fn wait_with_timeout(
    mut child: Child,
    program: &str,
    input: Option<&[u8]>,
    timeout: Duration,
) -> Result<Output> {
    let stdin = child.stdin.take();
    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    let work = async {
        let feed = async {
            if let (Some(mut pipe), Some(bytes)) = (stdin, input) {
                // A child that exits early closes the pipe; its exit status reports why.
                let _ = pipe.write_all(bytes).await;
                drop(pipe);
            }
        };
        let read_out = async {
            let mut buf = Vec::new();
            if let Some(h) = stdout_handle.as_mut() {
                let _ = h.read_to_end(&mut buf).await;
            }
            buf
        };
        let read_err = async {
            let mut buf = Vec::new();
            if let Some(h) = stderr_handle.as_mut() {
                let _ = h.read_to_end(&mut buf).await;
            }
            buf
        };
        let ((), stdout, stderr) = tokio::join!(feed, read_out, read_err);
        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))?;
        trace!(program, code = ?status.code(), "exited");
        Ok::<_, anyhow::Error>(Output {
            status,
            stdout,
            stderr,
        })
    };

    tokio::select! {
        result = work => result,
        () = tokio::time::sleep(timeout) => {
            let _ = child.kill().await;
            anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
        }
    }
}
