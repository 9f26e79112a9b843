//! Output file placement.
//!
//! The map is written to a temporary file next to its destination and
//! renamed into place, so a failed write never leaves a partial PNG.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Destination path `<dir>/<name>.png`.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidInput`] if `name` is empty or contains
/// a path separator.
pub fn output_path(dir: &Path, name: &str) -> io::Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("output name must be a bare file stem, got {name:?}"),
        ));
    }
    Ok(dir.join(format!("{name}.png")))
}

/// Write `bytes` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns any I/O error from creating, writing or renaming the
/// temporary file. The destination is untouched on error.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn output_path_appends_png() {
        let path = output_path(Path::new("out"), "map").unwrap();
        assert_eq!(path, Path::new("out").join("map.png"));
    }

    #[test]
    fn output_path_rejects_separators() {
        for name in ["", "a/b", "a\\b"] {
            let err = output_path(Path::new("."), name).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(dir.path(), "map").unwrap();
        write_atomic(&path, b"png bytes").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png bytes");
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        std::fs::write(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn write_leaves_only_the_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        write_atomic(&path, b"data").unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["map.png"]);
    }

    #[test]
    fn write_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("map.png");
        assert!(write_atomic(&path, b"data").is_err());
        assert!(!path.exists());
    }
}
