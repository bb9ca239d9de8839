//! `convoy deploy`: bundle, provision and restart in one run.

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::application::services::deploy::{DeployPorts, deploy};
use crate::infra::bundle::TarGzArchiver;
use crate::infra::secrets::EnvSecretProvider;
use crate::infra::ssh::SshTransport;
use crate::infra::systemd::Systemd;
use crate::output::{TerminalReporter, json};

/// Local file whose entries back up the process environment for secrets.
const DOTENV: &str = ".env";

/// Run the deploy command.
///
/// # Errors
///
/// Returns the first [`crate::domain::error::DeployError`] raised by the
/// run, or an error if local setup fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let (config, target) = app.resolve()?;

    let secrets = EnvSecretProvider::with_dotenv(&config.bundle.root.join(DOTENV))?;
    let transport = SshTransport::default_runner(target.clone());
    let services = Systemd::with_sudo(&transport);
    let archiver = TarGzArchiver;
    let work_dir = tempfile::tempdir().context("cannot create bundle work directory")?;
    let ports = DeployPorts {
        transport: &transport,
        services: &services,
        archiver: &archiver,
        secrets: &secrets,
    };

    let outcome = {
        let reporter = TerminalReporter::new(&app.output);
        deploy(&ports, &config, &target, work_dir.path(), &reporter).await?
    };

    if app.is_json() {
        json::print(&outcome)
    } else {
        app.renderer().render_deploy(&outcome);
        Ok(())
    }
}
