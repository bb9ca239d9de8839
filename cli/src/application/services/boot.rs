//! Boot-time assertion: wait for the host to settle, then make sure the
//! managed service is loaded, enabled and started.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Runs once per invocation; it never loops or retries.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::application::ports::{BootLog, ServiceManager};
use crate::domain::boot::{BootAction, BootPhase, BootRecord};

/// Move from `Dormant` to `Asserted`: sleep `settle`, issue
/// `daemon-reload`, `enable` and `start`, then append one record to `log`.
///
/// Failed actions are recorded in the returned [`BootRecord`]; they do not
/// make this function fail.
///
/// # Errors
///
/// Returns an error only if the record cannot be appended to the log.
#[instrument(skip(services, log, now))]
pub async fn assert_on_boot(
    services: &impl ServiceManager,
    log: &impl BootLog,
    unit: &str,
    settle: Duration,
    now: impl FnOnce() -> DateTime<Utc>,
) -> Result<BootRecord> {
    info!(phase = ?BootPhase::Dormant, "waiting for host to settle");
    tokio::time::sleep(settle).await;

    let actions = vec![
        action("daemon-reload", services.daemon_reload().await),
        action("enable", services.enable(unit).await),
        action("start", services.start(unit).await),
    ];
    let record = BootRecord {
        at: now(),
        unit: unit.to_string(),
        phase: BootPhase::Asserted,
        actions,
    };
    if record.succeeded() {
        info!("service asserted");
    } else {
        warn!(line = %record.to_log_line(), "boot assertion incomplete");
    }

    log.append(&record).context("writing boot log")?;
    Ok(record)
}

fn action(name: &'static str, result: Result<std::process::Output>) -> BootAction {
    match result {
        Ok(out) if out.status.success() => BootAction {
            action: name,
            ok: true,
            detail: None,
        },
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            BootAction {
                action: name,
                ok: false,
                detail: (!stderr.is_empty()).then_some(stderr),
            }
        }
        Err(e) => BootAction {
            action: name,
            ok: false,
            detail: Some(format!("{e:#}")),
        },
    }
}
