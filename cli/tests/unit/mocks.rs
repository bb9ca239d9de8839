//! Shared output helpers for unit tests.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}
