//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la discovery degli asset.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva dei file sotto una directory del progetto
//! - Classificazione degli asset (raster, vettoriali, ignorati)
//! - Copia dei file derivati nel sito renderizzato
//!
//! ## Formati supportati:
//! - **Raster**: PNG, JPG, JPEG
//! - **Vettoriali**: SVG
//!
//! Tutti i path restituiti sono relativi alla root del progetto, cioè
//! esattamente la forma usata nei riferimenti dentro l'HTML renderizzato.
//!
//! ## Esempio:
//! ```ignore
//! let assets = FileManager::find_files(&config.root, &config.assets_dir)?;
//! for asset in assets {
//!     match AssetKind::classify(&asset) { /* ... */ }
//! }
//! ```

use crate::error::CompressError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// How a source asset is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Recompressed into every raster target format
    Raster,
    /// Minified, extension preserved
    Vector,
}

impl AssetKind {
    /// Classify a path by extension; `None` for anything that isn't an image
    pub fn classify(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("png" | "jpg" | "jpeg") => Some(Self::Raster),
            Some("svg") => Some(Self::Vector),
            _ => None,
        }
    }

    /// Source extensions probed when looking for an original raster image
    pub const RASTER_EXTENSIONS: &'static [&'static str] = &["png", "jpg", "jpeg"];
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find every file under `root/dir`, returned relative to `root`
    pub fn find_files(root: &Path, dir: &Path) -> Result<Vec<PathBuf>, CompressError> {
        let base = root.join(dir);
        if !base.is_dir() {
            debug!("Directory not found, nothing to walk: {}", base.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&base).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(root).map_err(|_| {
                CompressError::InvalidPath(format!("{} escapes {}", entry.path().display(), root.display()))
            })?;
            files.push(relative.to_path_buf());
        }

        Ok(files)
    }

    /// Find rendered HTML pages under `root/dir`
    pub fn find_html_files(root: &Path, dir: &Path) -> Result<Vec<PathBuf>, CompressError> {
        Ok(Self::find_files(root, dir)?
            .into_iter()
            .filter(|path| path.to_str().is_some_and(|s| s.ends_with(".html")))
            .collect())
    }

    /// Copy a file, creating the destination's parent directories
    pub async fn copy_with_parents(from: &Path, to: &Path) -> Result<(), CompressError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(from, to).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classify() {
        assert_eq!(AssetKind::classify(Path::new("a/logo.png")), Some(AssetKind::Raster));
        assert_eq!(AssetKind::classify(Path::new("a/photo.jpeg")), Some(AssetKind::Raster));
        assert_eq!(AssetKind::classify(Path::new("a/photo.jpg")), Some(AssetKind::Raster));
        assert_eq!(AssetKind::classify(Path::new("a/diagram.svg")), Some(AssetKind::Vector));
        assert_eq!(AssetKind::classify(Path::new("a/logo-min.webp")), None);
        assert_eq!(AssetKind::classify(Path::new("a/readme")), None);
    }

    #[test]
    fn test_find_files_relative_to_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("assets/icons")).unwrap();
        std::fs::write(root.join("assets/icons/logo.png"), b"png").unwrap();
        std::fs::write(root.join("assets/top.svg"), b"svg").unwrap();

        let files = FileManager::find_files(root, Path::new("assets")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("assets/icons/logo.png"), PathBuf::from("assets/top.svg")]
        );
    }

    #[test]
    fn test_find_files_missing_dir() {
        let temp = TempDir::new().unwrap();
        let files = FileManager::find_files(temp.path(), Path::new("_site")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_find_html_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("_site/blog")).unwrap();
        std::fs::write(root.join("_site/index.html"), "").unwrap();
        std::fs::write(root.join("_site/blog/post.html"), "").unwrap();
        std::fs::write(root.join("_site/style.css"), "").unwrap();

        let files = FileManager::find_html_files(root, Path::new("_site")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("_site/blog/post.html"), PathBuf::from("_site/index.html")]
        );
    }

    #[tokio::test]
    async fn test_copy_with_parents() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.txt");
        let to = temp.path().join("deep/nested/a.txt");
        std::fs::write(&from, b"data").unwrap();

        FileManager::copy_with_parents(&from, &to).await.unwrap();
        assert_eq!(std::fs::read(&to).unwrap(), b"data");
    }
}
