//! On-disk cache of extracted text: one `<stem>.txt` per source document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ProcessError;

pub const ARTIFACT_EXTENSION: &str = "txt";

/// `<output_dir>/<source stem>.txt`
pub fn artifact_path(output_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}.{}", stem, ARTIFACT_EXTENSION))
}

/// Returns the cached text, or `None` when no artifact exists yet.
pub fn read_artifact(path: &Path) -> Result<Option<String>, ProcessError> {
    if !path.is_file() {
        return Ok(None);
    }

    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Writes through a sibling temp file and renames, so readers never see a
/// partially written artifact.
pub fn write_artifact(path: &Path, text: &str) -> Result<(), ProcessError> {
    let write_err = |e: std::io::Error| ProcessError::WriteArtifact {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp_path = path.with_extension(format!("{}.tmp", ARTIFACT_EXTENSION));
    {
        let mut file = fs::File::create(&tmp_path).map_err(write_err)?;
        file.write_all(text.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_err(e)
    })
}

/// Removes an artifact if present. Returns whether a file was removed.
pub fn remove_artifact(path: &Path) -> Result<bool, ProcessError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ProcessError::WriteArtifact {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_path_uses_stem() {
        let path = artifact_path(Path::new("/out"), Path::new("/data/report.final.pdf"));
        assert_eq!(path, PathBuf::from("/out/report.final.txt"));
    }

    #[test]
    fn test_read_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let result = read_artifact(&dir.path().join("none.txt")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("report.txt");

        write_artifact(&path, "héllo\nworld").unwrap();

        assert_eq!(read_artifact(&path).unwrap().as_deref(), Some("héllo\nworld"));
        assert!(!path.with_extension("txt.tmp").exists());
    }

    #[test]
    fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");

        write_artifact(&path, "first").unwrap();
        write_artifact(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_remove_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        write_artifact(&path, "x").unwrap();

        assert!(remove_artifact(&path).unwrap());
        assert!(!remove_artifact(&path).unwrap());
    }
}
