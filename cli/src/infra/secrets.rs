//! Infrastructure implementation of the `SecretProvider` port.
//!
//! Secrets come from the invoking process environment, optionally seeded
//! from a local `.env` file that never overrides variables already set.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use crate::application::ports::SecretProvider;
use crate::domain::error::DeployError;

/// Reads secrets from the process environment, falling back to a dotenv file.
#[derive(Debug, Default)]
pub struct EnvSecretProvider {
    fallback: HashMap<String, String>,
}

impl EnvSecretProvider {
    /// Provider over the process environment only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that also consults `path` (dotenv syntax) for keys the
    /// environment does not set. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Configuration`] if the file exists but cannot
    /// be read or parsed.
    pub fn with_dotenv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let invalid =
            |e: dotenvy::Error| DeployError::Configuration(format!("cannot load {}: {e}", path.display()));
        let fallback = dotenvy::from_path_iter(path)
            .map_err(invalid)?
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(invalid)?;
        tracing::debug!(path = %path.display(), keys = fallback.len(), "loaded dotenv fallback");
        Ok(Self { fallback })
    }
}

impl SecretProvider for EnvSecretProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.fallback.get(key).cloned())
    }
}
