//! Boot-time assertion: state machine, log record, and the trigger unit.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Two-state lifecycle of one boot-time assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootPhase {
    /// Host booting; nothing issued yet.
    Dormant,
    /// Settle delay elapsed and reload/enable/start were issued.
    Asserted,
}

/// Outcome of one service-manager call made during the assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootAction {
    pub action: &'static str,
    pub ok: bool,
    /// Trimmed stderr (or the spawn error) when `ok` is false.
    pub detail: Option<String>,
}

/// One line in the boot log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootRecord {
    pub at: DateTime<Utc>,
    pub unit: String,
    pub phase: BootPhase,
    pub actions: Vec<BootAction>,
}

impl BootRecord {
    /// `true` when every action was accepted by the service manager.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.actions.iter().all(|a| a.ok)
    }

    /// Single-line rendering, e.g.
    /// `2026-10-18T07:00:31Z unit=qgen daemon-reload=ok enable=ok start=failed(...)`.
    #[must_use]
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "{} unit={}",
            self.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.unit
        );
        for action in &self.actions {
            line.push(' ');
            line.push_str(action.action);
            line.push('=');
            match (&action.detail, action.ok) {
                (_, true) => line.push_str("ok"),
                (Some(detail), false) => {
                    line.push_str("failed(");
                    line.push_str(&detail.replace('\n', " "));
                    line.push(')');
                }
                (None, false) => line.push_str("failed"),
            }
        }
        line
    }
}

/// Name of the oneshot unit that triggers the assertion at boot.
#[must_use]
pub fn boot_hook_unit_name(unit: &str) -> String {
    format!("{unit}-boot-assert.service")
}

/// Render the oneshot unit that runs `convoy _boot-assert` once per boot.
#[must_use]
pub fn render_boot_hook_unit(
    unit: &str,
    convoy_path: &str,
    log_path: &str,
    settle_secs: u64,
) -> String {
    format!(
        "[Unit]\n\
         Description=Re-assert {unit}.service after boot\n\
         After=network-online.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         Type=oneshot\n\
         ExecStart={convoy_path} _boot-assert --unit {unit} --log {log_path} --settle-secs {settle_secs}\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n"
    )
}
