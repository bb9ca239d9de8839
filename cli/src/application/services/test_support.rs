//! Shared test helpers for application service tests.
//!
//! `FakeHost` implements the transport and service-manager ports against an
//! in-memory filesystem and a tiny systemd model, so whole deploy runs can be
//! exercised without a live host. Every command is recorded in order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;

use crate::application::ports::{FileTransfer, RemoteShell, ServiceManager};
use crate::domain::bundle::{ArchiveFormat, Bundle, hex_encode};
use crate::domain::target::SYSTEMD_UNIT_DIR;

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    std::process::ExitStatus::from_raw(code as u32)
}

pub fn output(code: i32, stdout: &str, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Mutable view of the simulated host.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub enabled: BTreeSet<String>,
    pub active: BTreeSet<String>,
    pub commands: Vec<String>,
    /// Commands whose joined text contains this string exit 1.
    pub fail_when: Option<String>,
    pub unreachable: bool,
    pub auth_rejected: bool,
    /// `systemctl start`/`restart` is accepted by the manager but the job fails.
    pub start_job_fails: bool,
}

pub struct FakeHost {
    state: RefCell<HostState>,
}

impl FakeHost {
    /// Host with only `/tmp` and the systemd unit directory present.
    pub fn new() -> Self {
        let mut state = HostState::default();
        add_dir_with_parents(&mut state.dirs, "/tmp");
        add_dir_with_parents(&mut state.dirs, SYSTEMD_UNIT_DIR);
        Self {
            state: RefCell::new(state),
        }
    }

    pub fn with(&self, f: impl FnOnce(&mut HostState)) -> &Self {
        f(&mut self.state.borrow_mut());
        self
    }

    pub fn snapshot(&self) -> HostState {
        self.state.borrow().clone()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.borrow().files.get(path).cloned()
    }

    pub fn file_string(&self, path: &str) -> Option<String> {
        self.file(path).map(|b| String::from_utf8(b).expect("utf-8 file"))
    }

    pub fn put_file(&self, path: &str, content: &[u8]) {
        let mut st = self.state.borrow_mut();
        add_dir_with_parents(&mut st.dirs, parent(path));
        st.files.insert(path.to_string(), content.to_vec());
    }

    pub fn put_dir(&self, path: &str) {
        add_dir_with_parents(&mut self.state.borrow_mut().dirs, path);
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Number of recorded commands starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Output {
        let line = args.join(" ");
        let mut st = self.state.borrow_mut();
        st.commands.push(line.clone());

        if st.unreachable {
            return output(255, "", "ssh: connect to host fake port 22: Connection timed out");
        }
        if st.auth_rejected {
            return output(255, "", "deploy@fake: Permission denied (publickey).");
        }
        if st.fail_when.as_deref().is_some_and(|p| line.contains(p)) {
            return output(1, "", "injected failure");
        }

        let args: Vec<&str> = match args {
            ["sudo", rest @ ..] => rest.to_vec(),
            _ => args.to_vec(),
        };
        match args.as_slice() {
            ["test", flag, path] => {
                let found = match *flag {
                    "-d" => st.dirs.contains(*path),
                    "-f" => st.files.contains_key(*path),
                    _ => st.dirs.contains(*path) || st.files.contains_key(*path),
                };
                output(i32::from(!found), "", "")
            }
            ["mkdir", "-p", path] => {
                add_dir_with_parents(&mut st.dirs, path);
                output(0, "", "")
            }
            ["tar", "-xzf", archive, "-C", dir] => {
                if !st.dirs.contains(*dir) {
                    return output(2, "", "tar: Cannot open: No such file or directory");
                }
                let Some(bytes) = st.files.get(*archive).cloned() else {
                    return output(2, "", "tar: Cannot open archive");
                };
                for (name, content) in unpack(&bytes) {
                    let path = format!("{dir}/{name}");
                    add_dir_with_parents(&mut st.dirs, parent(&path));
                    st.files.insert(path, content);
                }
                output(0, "", "")
            }
            ["rm", "-f", path] => {
                st.files.remove(*path);
                output(0, "", "")
            }
            ["python3", "-m", "venv", path] => {
                add_dir_with_parents(&mut st.dirs, &format!("{path}/bin"));
                st.files.insert(format!("{path}/bin/pip"), Vec::new());
                output(0, "", "")
            }
            [pip, "install", ..] if pip.ends_with("/bin/pip") => {
                if st.files.contains_key(*pip) {
                    output(0, "Successfully installed flask gunicorn", "")
                } else {
                    output(127, "", "pip: command not found")
                }
            }
            ["sh", "-c", _script, "sh", path] => {
                if !st.dirs.contains(parent(path)) {
                    return output(1, "", "sh: cannot create: Directory nonexistent");
                }
                st.files
                    .insert((*path).to_string(), stdin.unwrap_or_default().to_vec());
                output(0, "", "")
            }
            ["touch", path] => {
                if !st.dirs.contains(parent(path)) {
                    return output(1, "", "touch: cannot touch: No such file or directory");
                }
                st.files.entry((*path).to_string()).or_default();
                output(0, "", "")
            }
            ["systemctl", rest @ ..] => systemctl(&mut st, rest),
            _ => output(127, "", "command not found"),
        }
    }
}

fn systemctl(st: &mut HostState, args: &[&str]) -> Output {
    let unit_exists = |st: &HostState, unit: &str| {
        st.files
            .contains_key(&format!("{SYSTEMD_UNIT_DIR}/{unit}.service"))
    };
    match args {
        ["daemon-reload"] => output(0, "", ""),
        ["enable", unit] => {
            if !unit_exists(st, *unit) {
                return output(1, "", "Failed to enable unit: Unit file does not exist.");
            }
            st.enabled.insert((*unit).to_string());
            output(0, "", "Created symlink")
        }
        ["start" | "restart", unit] => {
            if !unit_exists(st, *unit) {
                return output(5, "", &format!("Failed to start {unit}.service: Unit {unit}.service not found."));
            }
            if st.start_job_fails {
                st.active.remove(*unit);
                return output(1, "", &format!("Job for {unit}.service failed."));
            }
            st.active.insert((*unit).to_string());
            output(0, "", "")
        }
        ["status", unit, ..] => {
            if !unit_exists(st, *unit) {
                return output(4, "", &format!("Unit {unit}.service could not be found."));
            }
            if st.active.contains(*unit) {
                output(0, &format!("● {unit}.service\n   Active: active (running)\n"), "")
            } else {
                output(3, &format!("● {unit}.service\n   Active: inactive (dead)\n"), "")
            }
        }
        _ => output(1, "", "Unknown command verb."),
    }
}

impl RemoteShell for FakeHost {
    async fn exec(&self, args: &[&str]) -> Result<Output> {
        Ok(self.run(args, None))
    }

    async fn exec_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<Output> {
        Ok(self.run(args, Some(input)))
    }

    fn host(&self) -> &str {
        "fake"
    }
}

impl FileTransfer for FakeHost {
    async fn upload(&self, local: &Path, remote: &str) -> Result<Output> {
        let line = format!("upload {} {remote}", local.display());
        let mut st = self.state.borrow_mut();
        st.commands.push(line.clone());
        if st.unreachable {
            return Ok(output(255, "", "ssh: connect to host fake port 22: Connection timed out"));
        }
        if st.fail_when.as_deref().is_some_and(|p| line.contains(p)) {
            return Ok(output(1, "", "injected failure"));
        }
        st.files.insert(remote.to_string(), std::fs::read(local)?);
        Ok(output(0, "", ""))
    }
}

impl ServiceManager for FakeHost {
    async fn daemon_reload(&self) -> Result<Output> {
        self.exec(&["sudo", "systemctl", "daemon-reload"]).await
    }
    async fn enable(&self, unit: &str) -> Result<Output> {
        self.exec(&["sudo", "systemctl", "enable", unit]).await
    }
    async fn start(&self, unit: &str) -> Result<Output> {
        self.exec(&["sudo", "systemctl", "start", unit]).await
    }
    async fn restart(&self, unit: &str) -> Result<Output> {
        self.exec(&["sudo", "systemctl", "restart", unit]).await
    }
    async fn status(&self, unit: &str) -> Result<Output> {
        self.exec(&["systemctl", "status", unit, "--no-pager"]).await
    }
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("/", |(p, _)| if p.is_empty() { "/" } else { p })
}

fn add_dir_with_parents(dirs: &mut BTreeSet<String>, path: &str) {
    let mut current = path.trim_end_matches('/').to_string();
    while !current.is_empty() {
        dirs.insert(current.clone());
        match current.rsplit_once('/') {
            Some((p, _)) => current = p.to_string(),
            None => break,
        }
    }
    dirs.insert("/".to_string());
}

fn unpack(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(bytes));
    let mut out = Vec::new();
    for entry in archive.entries().expect("tar entries") {
        let mut entry = entry.expect("tar entry");
        let name = entry.path().expect("entry path").display().to_string();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).expect("entry content");
        out.push((name, content));
    }
    out
}

/// Pack `files` into a real tar.gz under `dir` and describe it as a `Bundle`.
pub fn bundle_in(dir: &Path, files: &[(&str, &[u8])]) -> Bundle {
    use sha2::{Digest, Sha256};

    let archive = dir.join("bundle.tar.gz");
    let file = std::fs::File::create(&archive).expect("create archive");
    let mut builder = tar::Builder::new(flate2::write::GzEncoder::new(
        file,
        flate2::Compression::default(),
    ));
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *content)
            .expect("append entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");

    let bytes = std::fs::read(&archive).expect("read archive");
    Bundle {
        files: files.iter().map(|(n, _)| PathBuf::from(n)).collect(),
        format: ArchiveFormat::TarGz,
        size: bytes.len() as u64,
        sha256: hex_encode(&Sha256::digest(&bytes)),
        archive,
    }
}

/// Reporter that drops every message.
pub struct SilentReporter;

impl crate::application::ports::ProgressReporter for SilentReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}
