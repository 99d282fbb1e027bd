//! Shared fixtures for unit tests.

use crate::config::Config;
use std::path::Path;
use tempfile::TempDir;

/// A temporary project root with the given root-relative files created
pub(crate) fn project(files: &[&str]) -> (TempDir, Config) {
    let temp = TempDir::new().unwrap();
    for file in files {
        write(temp.path(), file, file);
    }
    let config = Config {
        root: temp.path().to_path_buf(),
        workers: 2,
        show_progress: false,
        ..Default::default()
    };
    (temp, config)
}

pub(crate) fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
