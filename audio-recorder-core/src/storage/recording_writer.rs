use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use super::destination::{next_available_path, RECORDING_EXTENSION};
use crate::models::error::RecorderError;

/// How many taken names to skip before giving up on a racing directory.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// A recording file that has been written and flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenRecording {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// SHA-256 hex digest of the file contents.
    pub checksum: String,
}

/// Writes finished recordings under sequential names in one directory.
///
/// Names are `<prefix>_<n>.wav`. The existence probe is repeated at write
/// time with create-new semantics: if another process takes the chosen
/// name between probe and open, the writer moves on to the next index.
#[derive(Debug, Clone)]
pub struct RecordingWriter {
    directory: PathBuf,
    prefix: String,
}

impl RecordingWriter {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    /// The name the next `write` would try first.
    pub fn next_path(&self) -> PathBuf {
        next_available_path(&self.directory, &self.prefix, RECORDING_EXTENSION, 1).1
    }

    pub fn write(&self, bytes: &[u8]) -> Result<WrittenRecording, RecorderError> {
        let mut start = 1;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let (n, path) = next_available_path(&self.directory, &self.prefix, RECORDING_EXTENSION, start);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    log::debug!("{} was created concurrently, trying next name", path.display());
                    start = n + 1;
                    continue;
                }
                Err(e) => {
                    return Err(RecorderError::StorageError(format!(
                        "failed to create {}: {}",
                        path.display(),
                        e
                    )))
                }
            };

            file.write_all(bytes)
                .and_then(|_| file.sync_all())
                .map_err(|e| {
                    RecorderError::StorageError(format!("failed to write {}: {}", path.display(), e))
                })?;

            log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
            return Ok(WrittenRecording {
                path,
                bytes_written: bytes.len() as u64,
                checksum: hex_encode(&Sha256::digest(bytes)),
            });
        }

        Err(RecorderError::StorageError(format!(
            "no free file name for prefix '{}' in {}",
            self.prefix,
            self.directory.display()
        )))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
