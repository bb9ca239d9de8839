//! Boot resilience: the trigger unit and the hidden `_boot-assert` command
//! it runs once per boot on the target host.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::boot::assert_on_boot;
use crate::domain::boot::{boot_hook_unit_name, render_boot_hook_unit};
use crate::infra::boot_log::FileBootLog;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::systemd::{LocalShell, Systemd};
use crate::output::json;

/// Arguments for `_boot-assert`.
#[derive(Args)]
pub struct BootAssertArgs {
    /// Service unit to re-assert
    #[arg(long)]
    pub unit: String,

    /// Append-only log receiving one line per boot
    #[arg(long, value_name = "FILE")]
    pub log: PathBuf,

    /// Seconds to wait before issuing any command
    #[arg(long, default_value_t = 30)]
    pub settle_secs: u64,
}

/// Print the oneshot unit that triggers `_boot-assert` at boot.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn hook(app: &AppContext) -> Result<()> {
    let config = app.load_config()?;
    config.validate()?;
    let name = boot_hook_unit_name(&config.service.name);
    let unit = render_boot_hook_unit(
        &config.service.name,
        &config.boot.convoy_path,
        &config.boot.log_path.display().to_string(),
        config.boot.settle_secs,
    );

    if app.is_json() {
        return json::print(&serde_json::json!({ "name": name, "unit": unit }));
    }
    if !app.output.quiet {
        eprintln!("# install as /etc/systemd/system/{name} and run: systemctl enable {name}");
    }
    print!("{unit}");
    Ok(())
}

/// Wait for the host to settle, then reload, enable and start the unit.
///
/// Individual systemctl failures are recorded in the log, not returned.
///
/// # Errors
///
/// Returns an error only if the boot log cannot be written.
pub async fn assert(app: &AppContext, args: &BootAssertArgs) -> Result<()> {
    let shell = LocalShell::new(TokioCommandRunner::default());
    let services = Systemd::direct(&shell);
    let log = FileBootLog::new(&args.log);

    let record = assert_on_boot(
        &services,
        &log,
        &args.unit,
        Duration::from_secs(args.settle_secs),
        Utc::now,
    )
    .await?;

    if app.is_json() {
        return json::print(&record);
    }
    if !app.output.quiet {
        println!("{}", record.to_log_line());
    }
    Ok(())
}
