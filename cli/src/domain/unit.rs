//! systemd unit definition for the managed service.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[allow(clippy::expect_used)] // Pattern is a compile-time constant
static UNIT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.@-]{0,254}$").expect("valid regex"));

/// Returns `true` if `name` is a valid unit name (without the `.service` suffix).
#[must_use]
pub fn is_valid_unit_name(name: &str) -> bool {
    UNIT_NAME.is_match(name) && !name.ends_with(".service")
}

/// `Restart=` policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    Always,
    OnFailure,
    No,
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Always => "always",
            Self::OnFailure => "on-failure",
            Self::No => "no",
        })
    }
}

/// Everything needed to render the unit file.
///
/// Secrets are not inlined: the unit points at the env file through
/// `EnvironmentFile=`, which is rewritten on every deploy while the unit file
/// itself is written once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceUnitSpec {
    pub name: String,
    pub description: String,
    /// Account the service runs as.
    pub user: String,
    pub working_directory: String,
    /// Absolute command line, or relative to `working_directory`.
    pub start_command: String,
    pub restart: RestartPolicy,
    pub restart_sec: u32,
    /// Non-secret `Environment=` pairs, rendered in order.
    pub environment: Vec<(String, String)>,
    pub environment_file: Option<String>,
    pub after: String,
    pub wanted_by: String,
}

impl ServiceUnitSpec {
    /// `ExecStart=` value. systemd requires an absolute executable path, so a
    /// relative command is anchored at the working directory.
    #[must_use]
    pub fn exec_start(&self) -> String {
        if self.start_command.starts_with('/') {
            self.start_command.clone()
        } else {
            format!(
                "{}/{}",
                self.working_directory.trim_end_matches('/'),
                self.start_command
            )
        }
    }

    /// Render the unit file text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("[Unit]\n");
        out.push_str(&format!("Description={}\n", self.description));
        out.push_str(&format!("After={}\n", self.after));
        out.push_str(&format!("Wants={}\n", self.after));
        out.push('\n');
        out.push_str("[Service]\n");
        out.push_str(&format!("User={}\n", self.user));
        out.push_str(&format!("WorkingDirectory={}\n", self.working_directory));
        out.push_str(&format!("ExecStart={}\n", self.exec_start()));
        out.push_str(&format!("Restart={}\n", self.restart));
        out.push_str(&format!("RestartSec={}\n", self.restart_sec));
        for (key, value) in &self.environment {
            out.push_str(&format!(
                "Environment=\"{key}={}\"\n",
                value.replace('\\', "\\\\").replace('"', "\\\"")
            ));
        }
        if let Some(path) = &self.environment_file {
            out.push_str(&format!("EnvironmentFile={path}\n"));
        }
        out.push('\n');
        out.push_str("[Install]\n");
        out.push_str(&format!("WantedBy={}\n", self.wanted_by));
        out
    }
}
