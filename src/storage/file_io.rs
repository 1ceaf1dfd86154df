//! JSON file helpers shared by the repositories
//!
//! Reads treat a missing or blank file as an empty collection. Writes go to
//! a hidden sibling file first and are renamed over the target, so a reader
//! sees either the old document or the new one.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::FinanceError;

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> FinanceError {
    FinanceError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

/// `.transactions.json.tmp` next to `transactions.json`
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Load a JSON document, or `T::default()` when there is nothing to load
pub fn read_json<T, P>(path: P) -> Result<T, FinanceError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(storage_error("read", path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|e| storage_error("parse", path, e))
}

/// Replace the document at `path` with `data`
///
/// Serialization happens before anything touches the disk. On any failure
/// the staging file is removed and the previous document is left intact.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), FinanceError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut bytes =
        serde_json::to_vec_pretty(data).map_err(|e| storage_error("serialize", path, e))?;
    bytes.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| storage_error("create directory for", path, e))?;
    }

    let staging = staging_path(path);
    let result = stage(&staging, &bytes)
        .and_then(|()| fs::rename(&staging, path).map_err(|e| storage_error("replace", path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn stage(staging: &Path, bytes: &[u8]) -> Result<(), FinanceError> {
    let mut file = File::create(staging).map_err(|e| storage_error("create", staging, e))?;
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .map_err(|e| storage_error("write", staging, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Snapshot {
        owner: String,
        cents: i64,
    }

    fn sample() -> Snapshot {
        Snapshot {
            owner: "alice".to_string(),
            cents: 4200,
        }
    }

    #[test]
    fn test_missing_or_blank_file_reads_as_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.json");
        let data: Snapshot = read_json(&path).unwrap();
        assert_eq!(data, Snapshot::default());

        fs::write(&path, " \n").unwrap();
        let data: Snapshot = read_json(&path).unwrap();
        assert_eq!(data, Snapshot::default());
    }

    #[test]
    fn test_write_and_read_leaves_no_staging_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");

        write_json_atomic(&path, &sample()).unwrap();
        let loaded: Snapshot = read_json(&path).unwrap();
        assert_eq!(loaded, sample());
        assert!(!temp_dir.path().join(".budgets.json.tmp").exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("goals.json");

        write_json_atomic(&path, &sample()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_failed_replace_keeps_target_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("series.json");
        fs::create_dir(&path).unwrap();

        let err = write_json_atomic(&path, &sample()).unwrap_err();
        assert!(matches!(err, FinanceError::Storage(ref msg) if msg.contains("series.json")));
        assert!(path.is_dir());
        assert!(!temp_dir.path().join(".series.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("series.json");
        fs::write(&path, "{ not json").unwrap();

        let result: Result<Snapshot, _> = read_json(&path);
        assert!(matches!(result, Err(FinanceError::Storage(msg)) if msg.contains("parse")));
    }
}
