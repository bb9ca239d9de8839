//! `convoy bundle`: build the archive locally without touching the host.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::BundleArchiver;
use crate::domain::error::DeployError;
use crate::infra::bundle::TarGzArchiver;
use crate::output::json;

/// Arguments for the bundle command.
#[derive(Args)]
pub struct BundleArgs {
    /// Directory the archive is written to (created if missing)
    #[arg(short, long, value_name = "DIR", default_value = "dist")]
    pub out: PathBuf,
}

/// Run the bundle command.
///
/// # Errors
///
/// Returns [`DeployError::Configuration`] if a listed file is missing or the
/// archive cannot be written.
pub fn run(app: &AppContext, args: &BundleArgs) -> Result<()> {
    let config = app.load_config()?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("cannot create {}", args.out.display()))?;
    let bundle = TarGzArchiver
        .pack(&config.bundle.root, &config.bundle.files, &args.out)
        .map_err(|e| DeployError::Configuration(format!("{e:#}")))?;

    if app.is_json() {
        json::print(&bundle)
    } else {
        app.renderer().render_bundle(&bundle);
        Ok(())
    }
}
