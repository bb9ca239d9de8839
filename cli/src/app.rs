//! Application context: state shared by every command handler.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{DeployConfig, TargetOverrides};
use crate::domain::error::DeployError;
use crate::domain::target::DeployTarget;
use crate::infra::config::YamlConfigStore;
use crate::output::{HumanRenderer, OutputContext};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub json: bool,
    pub quiet: bool,
    pub no_color: bool,
    /// Explicit `--config` path.
    pub config: Option<PathBuf>,
    pub overrides: TargetOverrides,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Where the deploy configuration is read from.
    pub config_store: YamlConfigStore,
    overrides: TargetOverrides,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// JSON mode implies quiet terminal output so stdout carries only the
    /// JSON document.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let config_store = flags
            .config
            .as_ref()
            .map_or_else(YamlConfigStore::default, YamlConfigStore::at);

        Self {
            output: OutputContext::new(flags.no_color, flags.quiet || flags.json),
            mode,
            config_store,
            overrides: flags.overrides.clone(),
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    /// Load the configuration file and apply CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_config(&self) -> Result<DeployConfig> {
        let config = self.config_store.load()?;
        Ok(config.with_overrides(self.overrides.clone()))
    }

    /// Load and validate the configuration and resolve the deploy target.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Configuration`] if anything required is
    /// missing or invalid.
    pub fn resolve(&self) -> Result<(DeployConfig, DeployTarget)> {
        let config = self
            .load_config()
            .map_err(|e| DeployError::Configuration(format!("{e:#}")))?;
        config.validate().map_err(DeployError::from)?;
        let target = config.target().map_err(DeployError::from)?;
        Ok((config, target))
    }
}
