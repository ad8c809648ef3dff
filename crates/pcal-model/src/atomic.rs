//! Whole-file replacement through a sibling temporary file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{ModelError, ModelResult};

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.pcal-tmp"))
}

/// Replace `path` with `contents` so readers see either the old or the new
/// file, never a partial one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> ModelResult<()> {
    let tmp = temp_sibling(path);
    fs::write(&tmp, contents).map_err(|e| ModelError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ModelError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file_and_leaves_no_temp() {
        let dir = std::env::temp_dir().join("pcal_model_atomic");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("target.csv");
        fs::write(&path, "old contents that are longer\n").unwrap();

        write_atomic(&path, b"new\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn missing_directory_reports_path() {
        let path = std::env::temp_dir()
            .join("pcal_model_atomic_missing")
            .join("nested")
            .join("file.csv");
        let err = write_atomic(&path, b"x").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
        assert!(!err.is_trial_fatal());
    }
}
