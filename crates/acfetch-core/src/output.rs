//! Local output file, written incrementally and swapped into place on success.
//!
//! Bytes land in a temporary file next to the destination. Only
//! [`OutputFile::commit`] renames it over the destination, so a failed transfer
//! leaves neither a partial file nor a clobbered previous download.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::FetchError;

/// What a completed download wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    /// Final location of the downloaded file
    pub path: PathBuf,
    pub bytes_written: u64,
    /// BLAKE3 digest of the content, hex encoded
    pub blake3: String,
}

/// Output file being written. Dropping it without committing removes the
/// temporary file and closes its handle.
#[derive(Debug)]
pub struct OutputFile {
    dest: PathBuf,
    temp: NamedTempFile,
    hasher: blake3::Hasher,
    bytes_written: u64,
}

impl OutputFile {
    /// Open a temporary file in the destination's directory.
    pub fn create(dest: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let dest = dest.into();
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(".acfetch-").suffix(".part");
        // Same mode as a freshly created file: 0o666 minus the umask
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }

        let temp = builder
            .tempfile_in(&dir)
            .map_err(|e| FetchError::io(&dest, e))?;

        Ok(Self {
            dest,
            temp,
            hasher: blake3::Hasher::new(),
            bytes_written: 0,
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), FetchError> {
        self.temp
            .write_all(chunk)
            .map_err(|e| FetchError::io(&self.dest, e))?;
        self.hasher.update(chunk);
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Flush and move the content over the destination, replacing any existing file.
    ///
    /// An existing destination keeps its permissions.
    pub fn commit(mut self) -> Result<DownloadReport, FetchError> {
        if let Ok(existing) = std::fs::metadata(&self.dest) {
            if existing.is_file() {
                self.temp
                    .as_file()
                    .set_permissions(existing.permissions())
                    .map_err(|e| FetchError::io(&self.dest, e))?;
            }
        }

        self.temp
            .as_file_mut()
            .sync_all()
            .map_err(|e| FetchError::io(&self.dest, e))?;

        self.temp
            .persist(&self.dest)
            .map_err(|e| FetchError::io(&self.dest, e.error))?;

        Ok(DownloadReport {
            path: self.dest,
            bytes_written: self.bytes_written,
            blake3: self.hasher.finalize().to_hex().to_string(),
        })
    }
}
