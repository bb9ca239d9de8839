//! `convoy plan`: dry run over a fresh probe of the host.

use anyhow::Result;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::services::probe::probe;
use crate::domain::plan::{self, ProvisionStep};
use crate::domain::remote_state::RemoteState;
use crate::infra::ssh::SshTransport;
use crate::output::json;

#[derive(Serialize)]
struct PlanReport<'a> {
    host: &'a str,
    state: RemoteState,
    steps: Vec<ProvisionStep>,
    skipped: Vec<ProvisionStep>,
}

/// Run the plan command. Nothing on the host is modified.
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
    let steps = plan::plan(&state);
    let skipped = plan::skipped(&state);

    if app.is_json() {
        return json::print(&PlanReport {
            host: &target.host,
            state,
            steps,
            skipped,
        });
    }
    app.renderer().render_plan(&target.host, &steps, &skipped);
    Ok(())
}
