//! # HTML Patcher Module
//!
//! Sostituisce nelle pagine renderizzate i riferimenti agli output noti come
//! rotti con un fallback dello stesso nome in un formato diverso.
//!
//! La sostituzione è un semplice replace di sottostringhe, non un editing
//! strutturale dell'HTML: i path derivati sono token univoci.
//!
//! ## Scelta del fallback:
//! 1. Formati precedenti nell'ordine di downgrade (avif → webp → jpg) non rotti
//! 2. Altrimenti l'immagine sorgente originale, se esiste su disco
//! 3. Altrimenti il riferimento resta invariato
//!
//! Il downgrade a un altro formato derivato non controlla il disco: le pagine
//! vengono patchate in parallelo alla compressione, quindi l'output può non
//! esistere ancora. Il sorgente invece non viene mai generato, per cui lì
//! l'esistenza su disco è verificata.

use crate::config::Config;
use crate::error::CompressError;
use crate::file_manager::AssetKind;
use crate::optimizer::path_resolver::PathResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Rewrites references to broken derived outputs
#[derive(Clone)]
pub struct HtmlPatcher {
    config: Arc<Config>,
}

impl HtmlPatcher {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Fallback for a broken derived output, if there is one
    pub fn fallback_for(&self, broken: &Path) -> Option<PathBuf> {
        let extension = broken.extension()?.to_str()?;
        let formats = &self.config.raster_formats;
        let position = formats.iter().position(|f| f.extension == extension)?;

        let downgrade = formats[..position]
            .iter()
            .rev()
            .map(|f| broken.with_extension(&f.extension))
            .find(|candidate| !self.config.is_broken(candidate));
        if downgrade.is_some() {
            return downgrade;
        }

        // Tutti i formati derivati sono rotti: si torna all'originale
        let stem = PathResolver::new(&self.config).source_stem(broken).ok()?;
        AssetKind::RASTER_EXTENSIONS
            .iter()
            .map(|ext| {
                let mut candidate = stem.clone().into_os_string();
                candidate.push(".");
                candidate.push(ext);
                PathBuf::from(candidate)
            })
            .find(|candidate| self.config.resolve(candidate).is_file())
    }

    /// Patch one root-relative HTML page in place; returns whether it changed
    pub async fn patch(&self, page: &Path) -> Result<bool, CompressError> {
        let path = self.config.resolve(page);
        let html = fs::read_to_string(&path).await?;
        let mut patched = html.clone();

        for broken in &self.config.broken_outputs {
            let Some(needle) = broken.to_str() else {
                continue;
            };
            if !patched.contains(needle) {
                continue;
            }

            match self.fallback_for(broken) {
                Some(fallback) => {
                    let replacement = fallback.to_str().ok_or_else(|| {
                        CompressError::InvalidPath(format!("Non UTF-8 path: {}", fallback.display()))
                    })?;
                    debug!("{}: {} -> {}", page.display(), needle, replacement);
                    patched = patched.replace(needle, replacement);
                }
                None => warn!("No fallback for {} referenced in {}", needle, page.display()),
            }
        }

        if patched == html {
            return Ok(false);
        }

        if self.config.dry_run {
            info!("🧪 Dry run: would patch {}", page.display());
            return Ok(true);
        }

        let mut file = OpenOptions::new().write(true).truncate(true).open(&path).await?;
        file.write_all(patched.as_bytes()).await?;
        file.flush().await?;

        info!("Patched broken image references in {}", page.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{project, write};

    const BROKEN_AVIF: &str = "assets/resized/future/final-stop-resolution-min.avif";

    #[test]
    fn test_fallback_downgrades_to_first_working_format() {
        let (temp, mut config) = project(&[]);
        config.broken_outputs = vec![PathBuf::from(BROKEN_AVIF)];
        let patcher = HtmlPatcher::new(Arc::new(config));

        // webp not generated yet: compression may still be running
        assert!(!temp.path().join("assets/resized/future/final-stop-resolution-min.webp").exists());
        assert_eq!(
            patcher.fallback_for(Path::new(BROKEN_AVIF)),
            Some(PathBuf::from("assets/resized/future/final-stop-resolution-min.webp"))
        );
    }

    #[test]
    fn test_fallback_to_source_when_every_format_is_broken() {
        let (_temp, config) = project(&["assets/future/final-stop-resolution.png"]);
        let patcher = HtmlPatcher::new(Arc::new(config));

        assert_eq!(
            patcher.fallback_for(Path::new(BROKEN_AVIF)),
            Some(PathBuf::from("assets/future/final-stop-resolution.png"))
        );
        assert_eq!(
            patcher.fallback_for(Path::new("assets/resized/future/final-stop-resolution-min.jpg")),
            Some(PathBuf::from("assets/future/final-stop-resolution.png"))
        );
    }

    #[test]
    fn test_no_fallback_without_source() {
        let (_temp, config) = project(&[]);
        let patcher = HtmlPatcher::new(Arc::new(config));
        assert_eq!(patcher.fallback_for(Path::new(BROKEN_AVIF)), None);
    }

    #[tokio::test]
    async fn test_patch_replaces_every_occurrence() {
        let (temp, config) = project(&["assets/future/final-stop-resolution.png"]);
        let html = format!(
            r#"<picture><source srcset="/{0}" type="image/avif"><img src="/{0}"></picture>"#,
            BROKEN_AVIF
        );
        write(temp.path(), "_site/future/index.html", &html);
        let patcher = HtmlPatcher::new(Arc::new(config));

        let changed = patcher.patch(Path::new("_site/future/index.html")).await.unwrap();

        assert!(changed);
        let content = std::fs::read_to_string(temp.path().join("_site/future/index.html")).unwrap();
        assert!(!content.contains(BROKEN_AVIF));
        assert_eq!(content.matches("assets/future/final-stop-resolution.png").count(), 2);
    }

    #[tokio::test]
    async fn test_patch_truncates_shorter_content() {
        let (temp, mut config) = project(&[]);
        config.broken_outputs = vec![PathBuf::from(BROKEN_AVIF)];
        let html = format!("<img src=\"{}\">\n", BROKEN_AVIF);
        write(temp.path(), "_site/index.html", &html);
        let patcher = HtmlPatcher::new(Arc::new(config));

        patcher.patch(Path::new("_site/index.html")).await.unwrap();

        let content = std::fs::read_to_string(temp.path().join("_site/index.html")).unwrap();
        assert_eq!(
            content,
            "<img src=\"assets/resized/future/final-stop-resolution-min.webp\">\n"
        );
    }

    #[tokio::test]
    async fn test_untouched_page_is_byte_identical() {
        let (temp, config) = project(&["assets/future/final-stop-resolution.png"]);
        let html = "<html>\r\n<img src=\"assets/resized/icons/logo-min.avif\">  </html>";
        write(temp.path(), "_site/index.html", html);
        let patcher = HtmlPatcher::new(Arc::new(config));

        let changed = patcher.patch(Path::new("_site/index.html")).await.unwrap();

        assert!(!changed);
        assert_eq!(std::fs::read(temp.path().join("_site/index.html")).unwrap(), html.as_bytes());
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let (temp, mut config) = project(&["assets/future/final-stop-resolution.png"]);
        config.dry_run = true;
        let html = format!("<img src=\"{}\">", BROKEN_AVIF);
        write(temp.path(), "_site/index.html", &html);
        let patcher = HtmlPatcher::new(Arc::new(config));

        assert!(patcher.patch(Path::new("_site/index.html")).await.unwrap());
        assert_eq!(std::fs::read_to_string(temp.path().join("_site/index.html")).unwrap(), html);
    }
}
