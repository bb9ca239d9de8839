//! `convoy config`: inspect the effective configuration.

use anyhow::{Context, Result};
use clap::Subcommand;
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::output::json;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration, CLI overrides included
    Show,
    /// Print the configuration file path in use
    Path,
}

/// Run a config subcommand.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(app),
        ConfigCommand::Path => path(app),
    }
}

fn show(app: &AppContext) -> Result<()> {
    let config = app.load_config()?;
    if app.is_json() {
        return json::print(&config);
    }
    let path = app.config_store.path()?;
    let yaml = serde_yaml::to_string(&config).context("YAML serialization failed")?;
    if !app.output.quiet {
        println!("{}", format!("# {}", path.display()).style(app.output.styles.dim));
    }
    print!("{yaml}");
    Ok(())
}

fn path(app: &AppContext) -> Result<()> {
    let path = app.config_store.path()?;
    if app.is_json() {
        return json::print(&serde_json::json!({
            "path": path,
            "exists": path.exists(),
        }));
    }
    println!("{}", path.display());
    Ok(())
}
