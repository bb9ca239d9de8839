//! Infrastructure implementation of the `BootLog` port: an append-only file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::BootLog;
use crate::domain::boot::BootRecord;

/// Appends one line per boot assertion to a local file.
pub struct FileBootLog {
    path: PathBuf,
}

impl FileBootLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BootLog for FileBootLog {
    fn append(&self, record: &BootRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("cannot open {}", self.path.display()))?;
        writeln!(file, "{}", record.to_log_line())
            .with_context(|| format!("cannot write {}", self.path.display()))
    }
}
