//! `convoy status`: what exists on the host and how the service is doing.

use anyhow::Result;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::services::{lifecycle, probe::probe};
use crate::domain::remote_state::RemoteState;
use crate::infra::ssh::SshTransport;
use crate::infra::systemd::Systemd;
use crate::output::json;

#[derive(Serialize)]
struct StatusReport<'a> {
    host: &'a str,
    unit: &'a str,
    state: RemoteState,
    service: Option<ServiceStatus>,
}

#[derive(Serialize)]
struct ServiceStatus {
    active: bool,
    status: String,
}

/// Run the status command.
///
/// The service is only queried when its unit file is installed.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the host cannot be
/// probed.
pub async fn run(app: &AppContext) -> Result<()> {
    let (config, target) = app.resolve()?;
    let layout = config.layout(&target);
    let transport = SshTransport::default_runner(target.clone());

    let state = probe(&transport, &layout).await?;
    let service = if state.service_unit_installed {
        let services = Systemd::with_sudo(&transport);
        let (status, active) = lifecycle::status(&services, &layout.unit_name).await?;
        Some(ServiceStatus { active, status })
    } else {
        None
    };

    if app.is_json() {
        return json::print(&StatusReport {
            host: &target.host,
            unit: &layout.unit_name,
            state,
            service,
        });
    }
    app.renderer().render_status(
        &target.host,
        &state,
        service.as_ref().map(|s| (s.status.as_str(), s.active)),
    );
    Ok(())
}
