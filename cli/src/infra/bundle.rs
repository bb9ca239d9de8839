//! Infrastructure implementation of the `BundleArchiver` port.
//!
//! Packs the bundle file set into a gzip-compressed tar archive. Entries are
//! written in the configured order with zeroed timestamps and ownership, so
//! identical inputs always produce an identical archive and digest.

use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::ports::BundleArchiver;
use crate::domain::bundle::{ArchiveFormat, Bundle, hex_encode, validate_entries};

/// Archive file name stem inside the output directory.
const ARCHIVE_STEM: &str = "bundle";

/// tar.gz archiver backed by the `tar` and `flate2` crates.
#[derive(Debug, Default)]
pub struct TarGzArchiver;

impl BundleArchiver for TarGzArchiver {
    fn pack(&self, root: &Path, files: &[PathBuf], out_dir: &Path) -> Result<Bundle> {
        validate_entries(files)?;
        for file in files {
            let path = root.join(file);
            anyhow::ensure!(
                path.is_file(),
                "bundle file {} not found under {}",
                file.display(),
                root.display()
            );
        }

        let format = ArchiveFormat::TarGz;
        let archive = out_dir.join(format!("{ARCHIVE_STEM}.{}", format.extension()));
        let out = File::create(&archive)
            .with_context(|| format!("cannot create {}", archive.display()))?;
        let mut builder = tar::Builder::new(GzEncoder::new(BufWriter::new(out), Compression::default()));

        for file in files {
            let path = root.join(file);
            let source =
                File::open(&path).with_context(|| format!("cannot read {}", path.display()))?;
            let meta = source
                .metadata()
                .with_context(|| format!("cannot stat {}", path.display()))?;
            let mut header = tar::Header::new_gnu();
            header.set_size(meta.len());
            header.set_mode(file_mode(&meta));
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            header.set_cksum();
            builder
                .append_data(&mut header, file, source)
                .with_context(|| format!("cannot add {} to archive", file.display()))?;
            debug!(file = %file.display(), bytes = meta.len(), "packed");
        }

        builder
            .into_inner()
            .context("cannot finish tar stream")?
            .finish()
            .context("cannot finish gzip stream")?;

        let (size, sha256) = digest(&archive)?;
        Ok(Bundle {
            files: files.to_vec(),
            format,
            archive,
            size,
            sha256,
        })
    }
}

#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if meta.permissions().mode() & 0o111 == 0 {
        0o644
    } else {
        0o755
    }
}

#[cfg(not(unix))]
fn file_mode(_meta: &std::fs::Metadata) -> u32 {
    0o644
}

/// Size and hex SHA-256 of the file at `path`.
fn digest(path: &Path) -> Result<(u64, String)> {
    let mut file = File::open(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("cannot read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((size, hex_encode(&hasher.finalize())))
}
