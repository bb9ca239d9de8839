//! Domain types and validators for convoy configuration.
//!
//! Pure functions only; no I/O or async.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::secrets::is_valid_env_key;
use crate::domain::target::{DEFAULT_SSH_PORT, DeployTarget, RemoteLayout};
use crate::domain::unit::{RestartPolicy, ServiceUnitSpec, is_valid_unit_name};

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `convoy.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DeployConfig {
    pub target: TargetConfig,
    pub bundle: BundleConfig,
    pub service: ServiceConfig,
    pub secrets: SecretsConfig,
    pub boot: BootConfig,
}

/// Remote host settings. `host` and `user` have no default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    /// Defaults to `/home/<user>/<service.name>`.
    pub base_dir: Option<String>,
    pub port: u16,
    pub identity_file: Option<PathBuf>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: None,
            user: None,
            base_dir: None,
            port: DEFAULT_SSH_PORT,
            identity_file: None,
        }
    }
}

/// What goes into the archive, relative to `root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BundleConfig {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            files: ["app.py", "requirements.txt", "cleaned_transcript.txt"]
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

/// Managed service and the remote files around it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// systemd unit name without `.service`.
    pub name: String,
    pub description: String,
    pub start_command: String,
    pub restart: RestartPolicy,
    pub restart_sec: u32,
    pub runtime_env: String,
    pub requirements: String,
    pub env_file: String,
    /// File the application owns after creation; never truncated.
    pub data_file: String,
    /// Plain (non-secret) environment for the unit file.
    pub environment: Vec<EnvVar>,
}

/// One non-secret `Environment=` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "qgen".to_string(),
            description: "Question generator API".to_string(),
            start_command: "venv/bin/gunicorn --bind 0.0.0.0:8000 app:app".to_string(),
            restart: RestartPolicy::Always,
            restart_sec: 5,
            runtime_env: "venv".to_string(),
            requirements: "requirements.txt".to_string(),
            env_file: ".env".to_string(),
            data_file: "generated_questions.json".to_string(),
            environment: vec![EnvVar {
                name: "PORT".to_string(),
                value: "8000".to_string(),
            }],
        }
    }
}

/// Secret keys resolved from the invoking environment at deploy time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SecretsConfig {
    /// Must be present and non-empty.
    pub required: Vec<String>,
    /// Copied when present, skipped otherwise.
    pub optional: Vec<String>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            required: vec!["GOOGLE_API_KEY".to_string()],
            optional: Vec::new(),
        }
    }
}

/// Boot-time assertion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootConfig {
    pub settle_secs: u64,
    pub log_path: PathBuf,
    /// Path of the convoy binary on the remote host, used in the boot hook.
    pub convoy_path: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            settle_secs: 30,
            log_path: PathBuf::from("/var/log/convoy-boot.log"),
            convoy_path: "/usr/local/bin/convoy".to_string(),
        }
    }
}

/// CLI-level overrides applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub base_dir: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
}

impl DeployConfig {
    /// Apply CLI overrides; `None` fields keep the file value.
    #[must_use]
    pub fn with_overrides(mut self, o: TargetOverrides) -> Self {
        if o.host.is_some() {
            self.target.host = o.host;
        }
        if o.user.is_some() {
            self.target.user = o.user;
        }
        if o.base_dir.is_some() {
            self.target.base_dir = o.base_dir;
        }
        if let Some(port) = o.port {
            self.target.port = port;
        }
        if o.identity_file.is_some() {
            self.target.identity_file = o.identity_file;
        }
        self
    }

    /// Resolve the deploy target.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if host or user is missing, or the base
    /// directory is not absolute.
    pub fn target(&self) -> Result<DeployTarget, ConfigError> {
        let host = non_empty(self.target.host.as_deref()).ok_or(ConfigError::Missing("target.host"))?;
        let user = non_empty(self.target.user.as_deref()).ok_or(ConfigError::Missing("target.user"))?;
        let base_dir = self
            .target
            .base_dir
            .clone()
            .unwrap_or_else(|| format!("/home/{user}/{}", self.service.name));
        if !base_dir.starts_with('/') || base_dir.trim_end_matches('/').is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "target.base_dir",
                value: base_dir,
                reason: "must be an absolute path below /",
            });
        }
        if self.target.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "target.port",
                value: "0".to_string(),
                reason: "must be between 1 and 65535",
            });
        }
        Ok(DeployTarget {
            host: host.to_string(),
            user: user.to_string(),
            base_dir,
            port: self.target.port,
            identity_file: self.target.identity_file.clone(),
        })
    }

    /// Remote layout for `target`.
    #[must_use]
    pub fn layout(&self, target: &DeployTarget) -> RemoteLayout {
        RemoteLayout::new(
            target,
            &self.service.runtime_env,
            &self.service.env_file,
            &self.service.data_file,
            &self.service.requirements,
            &self.service.name,
        )
    }

    /// Unit definition for `target`, pointing at the env file in `layout`.
    #[must_use]
    pub fn unit_spec(&self, target: &DeployTarget, layout: &RemoteLayout) -> ServiceUnitSpec {
        ServiceUnitSpec {
            name: self.service.name.clone(),
            description: self.service.description.clone(),
            user: target.user.clone(),
            working_directory: layout.base_dir.clone(),
            start_command: self.service.start_command.clone(),
            restart: self.service.restart,
            restart_sec: self.service.restart_sec,
            environment: self
                .service
                .environment
                .iter()
                .map(|e| (e.name.clone(), e.value.clone()))
                .collect(),
            environment_file: Some(layout.env_file.clone()),
            after: "network.target".to_string(),
            wanted_by: "multi-user.target".to_string(),
        }
    }

    /// Validate everything that does not depend on the target.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_unit_name(&self.service.name) {
            return Err(ConfigError::InvalidValue {
                key: "service.name",
                value: self.service.name.clone(),
                reason: "not a valid systemd unit name",
            });
        }
        if self.service.start_command.trim().is_empty() {
            return Err(ConfigError::Missing("service.start_command"));
        }
        for (key, name) in [
            ("service.runtime_env", &self.service.runtime_env),
            ("service.env_file", &self.service.env_file),
            ("service.data_file", &self.service.data_file),
            ("service.requirements", &self.service.requirements),
        ] {
            if !is_plain_relative(name) {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: name.clone(),
                    reason: "must be a relative path inside the base directory",
                });
            }
        }
        for var in &self.service.environment {
            if !is_valid_env_key(&var.name) {
                return Err(ConfigError::InvalidValue {
                    key: "service.environment",
                    value: var.name.clone(),
                    reason: "not a valid environment variable name",
                });
            }
        }
        for key in self.secrets.required.iter().chain(&self.secrets.optional) {
            if !is_valid_env_key(key) {
                return Err(ConfigError::InvalidValue {
                    key: "secrets",
                    value: key.clone(),
                    reason: "not a valid environment variable name",
                });
            }
        }
        if self.bundle.files.is_empty() {
            return Err(ConfigError::Missing("bundle.files"));
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_plain_relative(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && name.split('/').all(|part| !part.is_empty() && part != "..")
}

// ── Unit tests ───────────────────────────────────────────────────────────────
