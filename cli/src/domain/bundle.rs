//! The deployable artifact: which files it holds and how it is packed.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

/// Archive container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    /// gzip-compressed tar, unpacked remotely with `tar -xzf`.
    TarGz,
}

impl ArchiveFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
        }
    }
}

/// A packed bundle on the local filesystem, ready for transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    /// Entry names inside the archive, in packing order.
    pub files: Vec<PathBuf>,
    pub format: ArchiveFormat,
    pub archive: PathBuf,
    pub size: u64,
    /// Hex-encoded SHA-256 of the archive.
    pub sha256: String,
}

/// Validates bundle entry names before packing.
///
/// Entries must be relative, must not escape the bundle root, and must be
/// unique, so that unpacking on the remote host can only write inside the
/// base directory.
///
/// # Errors
///
/// Returns an error naming the first offending entry.
pub fn validate_entries(files: &[PathBuf]) -> Result<()> {
    anyhow::ensure!(!files.is_empty(), "bundle has no files");
    let mut seen = std::collections::BTreeSet::new();
    for file in files {
        anyhow::ensure!(
            is_contained(file),
            "bundle entry must be a relative path inside the project: {}",
            file.display()
        );
        anyhow::ensure!(
            seen.insert(file.clone()),
            "bundle entry listed twice: {}",
            file.display()
        );
    }
    Ok(())
}

fn is_contained(path: &Path) -> bool {
    path.components().count() > 0
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Lowercase hex encoding.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
