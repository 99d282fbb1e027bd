//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path derivati.
//! `derived_path` e `source_stem` sono l'una l'inversa dell'altra: il Pruner
//! dipende interamente da questa proprietà per riconoscere i file stale.
//!
//! ```text
//! Source:  assets/icons/logo.png
//! Derived: assets/resized/icons/logo-min.jpg   (webp, avif)
//! Mirror:  _site/assets/resized/icons/logo-min.jpg
//! Stem:    assets/icons/logo
//! ```

use crate::{config::Config, error::CompressError};
use std::path::{Path, PathBuf};

/// Bidirectional mapping between the source and derived namespaces
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    config: &'a Config,
}

impl<'a> PathResolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Remove one trailing compression marker, if present
    pub fn strip_suffix<'s>(&self, stem: &'s str) -> &'s str {
        stem.strip_suffix(self.config.suffix.as_str()).unwrap_or(stem)
    }

    /// Whether a stem already carries the compression marker
    pub fn has_suffix(&self, stem: &str) -> bool {
        stem.ends_with(self.config.suffix.as_str())
    }

    /// Whether a path lives under the derived-output tree
    pub fn is_derived(&self, path: &Path) -> bool {
        path.starts_with(&self.config.derived_dir)
    }

    /// Naming guard: only derived files may carry the compression marker
    pub fn check_source_name(&self, path: &Path) -> Result<(), CompressError> {
        let stem = file_stem(path)?;
        if !self.is_derived(path) && self.has_suffix(stem) {
            return Err(CompressError::IllegalFileName(path.to_path_buf()));
        }
        Ok(())
    }

    /// Directory derived outputs of `source` are written to
    pub fn output_dir(&self, source: &Path) -> Result<PathBuf, CompressError> {
        let parent = source.parent().unwrap_or(Path::new(""));

        // Un file già derivato produce le sue varianti accanto a sé
        if self.is_derived(source) {
            return Ok(parent.to_path_buf());
        }

        let relative = parent.strip_prefix(&self.config.assets_dir).map_err(|_| {
            CompressError::InvalidPath(format!(
                "{} is not under {}",
                source.display(),
                self.config.assets_dir.display()
            ))
        })?;
        Ok(join_relative(&self.config.derived_dir, relative))
    }

    /// Derived output path for `source` encoded as `extension`
    pub fn derived_path(&self, source: &Path, extension: &str) -> Result<PathBuf, CompressError> {
        let stem = file_stem(source)?;
        let dir = self.output_dir(source)?;
        Ok(dir.join(format!("{}{}.{}", stem, self.config.suffix, extension)))
    }

    /// Extension-stripped source path a derived file was generated from
    pub fn source_stem(&self, derived: &Path) -> Result<PathBuf, CompressError> {
        let parent = derived.parent().unwrap_or(Path::new(""));
        let relative = parent.strip_prefix(&self.config.derived_dir).map_err(|_| {
            CompressError::InvalidPath(format!(
                "{} is not under {}",
                derived.display(),
                self.config.derived_dir.display()
            ))
        })?;
        let stem = self.strip_suffix(file_stem(derived)?);
        Ok(join_relative(&self.config.assets_dir, relative).join(stem))
    }

    /// Copy of a derived file inside the rendered site tree
    pub fn mirror_path(&self, derived: &Path) -> PathBuf {
        self.config.site_dir.join(derived)
    }
}

/// Path without its final extension
pub fn strip_extension(path: &Path) -> PathBuf {
    path.with_extension("")
}

pub(crate) fn file_stem(path: &Path) -> Result<&str, CompressError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CompressError::InvalidPath(format!("Invalid file name: {}", path.display())))
}

// `join("")` leaves a trailing separator behind
fn join_relative(base: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(relative)
    }
}
