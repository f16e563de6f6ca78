use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::error::RecorderError;

/// Extension of every recording file.
pub const RECORDING_EXTENSION: &str = "wav";

/// Check that `dir` is a directory we can create files in.
///
/// Creates it first when `create_if_missing` is set. The check is a real
/// write: a uniquely named probe file is created and removed again.
pub fn validate_destination(dir: &Path, create_if_missing: bool) -> Result<(), RecorderError> {
    if dir.as_os_str().is_empty() {
        return Err(RecorderError::FolderUnwritable("no folder selected".into()));
    }

    if !dir.exists() {
        if !create_if_missing {
            return Err(RecorderError::FolderUnwritable(format!(
                "{} does not exist",
                dir.display()
            )));
        }
        fs::create_dir_all(dir).map_err(|e| {
            RecorderError::FolderUnwritable(format!("cannot create {}: {}", dir.display(), e))
        })?;
        log::info!("Created output directory {}", dir.display());
    }

    if !dir.is_dir() {
        return Err(RecorderError::FolderUnwritable(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let probe = dir.join(format!(".write_probe_{}.tmp", uuid::Uuid::new_v4()));
    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .and_then(|mut file| file.write_all(b"probe"));
    let removed = fs::remove_file(&probe);

    written.map_err(|e| {
        RecorderError::FolderUnwritable(format!("cannot write to {}: {}", dir.display(), e))
    })?;
    if let Err(e) = removed {
        log::warn!("Could not remove write probe {}: {}", probe.display(), e);
    }
    Ok(())
}

/// `<dir>/<prefix>_<n>.<ext>` for a given `n`.
pub fn numbered_path(dir: &Path, prefix: &str, n: u32, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", prefix, n, extension))
}

/// First `<prefix>_<n>.<ext>` in `dir` that does not exist, counting from
/// `start`. Returns the index alongside the path.
pub fn next_available_path(dir: &Path, prefix: &str, extension: &str, start: u32) -> (u32, PathBuf) {
    let mut n = start.max(1);
    loop {
        let path = numbered_path(dir, prefix, n, extension);
        if !path.exists() {
            return (n, path);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_name_after_existing_recordings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rec_1.wav"), b"").unwrap();
        fs::write(dir.path().join("rec_2.wav"), b"").unwrap();

        let (n, path) = next_available_path(dir.path(), "rec", "wav", 1);

        assert_eq!(n, 3);
        assert_eq!(path, dir.path().join("rec_3.wav"));
    }

    #[test]
    fn first_name_in_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (n, path) = next_available_path(dir.path(), "system_audio", "wav", 1);

        assert_eq!(n, 1);
        assert_eq!(path.file_name().unwrap(), "system_audio_1.wav");
    }

    #[test]
    fn gaps_are_filled_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rec_2.wav"), b"").unwrap();

        let (n, _) = next_available_path(dir.path(), "rec", "wav", 1);
        assert_eq!(n, 1);
    }

    #[test]
    fn other_prefixes_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("recording_1.wav"), b"").unwrap();

        let (n, _) = next_available_path(dir.path(), "system_audio", "wav", 1);
        assert_eq!(n, 1);
    }

    #[test]
    fn validate_accepts_writable_dir_and_leaves_no_probe() {
        let dir = tempfile::tempdir().unwrap();

        validate_destination(dir.path(), false).unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn validate_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Recordings").join("today");

        validate_destination(&nested, true).unwrap();

        assert!(nested.is_dir());
    }

    #[test]
    fn validate_rejects_missing_dir_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let err = validate_destination(&missing, false).unwrap_err();
        assert!(matches!(err, RecorderError::FolderUnwritable(_)));
        assert!(!missing.exists());
    }

    #[test]
    fn validate_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            validate_destination(&file, true),
            Err(RecorderError::FolderUnwritable(_))
        ));
        assert!(matches!(
            validate_destination(&file.join("child"), true),
            Err(RecorderError::FolderUnwritable(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_path() {
        assert!(validate_destination(Path::new(""), true).is_err());
    }
}
