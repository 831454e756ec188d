#![allow(dead_code, clippy::unwrap_used)]

use std::path::PathBuf;

/// Write `contents` as `file_name` inside a fresh temporary directory.
///
/// The directory is removed when the returned guard is dropped.
pub fn write_spec(file_name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(file_name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}
