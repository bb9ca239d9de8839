//! Infrastructure implementation of the `ConfigStore` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::DeployConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CONVOY_CONFIG";

/// Project-local config file name, looked up in the working directory.
pub const PROJECT_CONFIG: &str = "convoy.yaml";

/// Production implementation of `ConfigStore` that reads a YAML file.
///
/// Lookup order: an explicit path, then `$CONVOY_CONFIG`, then
/// `./convoy.yaml`, then `~/.convoy/config.yaml`. A missing file yields
/// defaults.
#[derive(Debug, Default)]
pub struct YamlConfigStore {
    explicit: Option<PathBuf>,
}

impl YamlConfigStore {
    /// Store that always reads `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(path.into()),
        }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<DeployConfig> {
        let path = self.path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(DeployConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let mut config: DeployConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        anchor_bundle_root(&mut config, &path);
        Ok(config)
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.explicit {
            return Ok(path.clone());
        }
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(val));
        }
        let local = PathBuf::from(PROJECT_CONFIG);
        if local.exists() {
            return Ok(local);
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".convoy").join("config.yaml"))
    }
}

/// A relative `bundle.root` is resolved against the config file's directory.
fn anchor_bundle_root(config: &mut DeployConfig, config_path: &Path) {
    if !config.bundle.root.is_relative() {
        return;
    }
    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        config.bundle.root = dir.join(&config.bundle.root);
    }
}
