//! # Stale Derivative Pruner
//!
//! Eseguito in modo sequenziale solo dopo che tutti i task del worker pool
//! sono terminati, per non competere con la generazione in corso.
//!
//! ## Algoritmo:
//! 1. Raccoglie i sorgenti (senza estensione) fuori dalla directory derivata
//! 2. Per ogni file derivato ricostruisce il sorgente con `PathResolver::source_stem`
//! 3. Se il sorgente non esiste più, elimina il derivato e la sua copia nel sito
//!
//! Una copia mancante nel sito è un errore fatale, a meno che
//! `tolerate_missing_mirror` sia attivo.

use crate::config::Config;
use crate::error::CompressError;
use crate::file_manager::FileManager;
use crate::optimizer::path_resolver::{strip_extension, PathResolver};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

/// Derived files removed by a prune pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
}

/// Deletes derived outputs whose source asset is gone
pub struct Pruner<'a> {
    config: &'a Config,
}

impl<'a> Pruner<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Extension-stripped paths of every live source asset
    fn source_stems(&self, resolver: &PathResolver<'_>) -> Result<HashSet<PathBuf>, CompressError> {
        Ok(FileManager::find_files(&self.config.root, &self.config.assets_dir)?
            .into_iter()
            .filter(|path| !resolver.is_derived(path))
            .map(|path| strip_extension(&path))
            .collect())
    }

    pub async fn prune(&self) -> Result<PruneReport, CompressError> {
        let resolver = PathResolver::new(self.config);
        let sources = self.source_stems(&resolver)?;
        let mut report = PruneReport::default();

        for derived in FileManager::find_files(&self.config.root, &self.config.derived_dir)? {
            // Gli output generati hanno sempre nomi UTF-8
            if derived.file_name().and_then(|name| name.to_str()).is_none() {
                warn!("Skipping non UTF-8 file in derived tree: {}", derived.display());
                continue;
            }

            let source = resolver.source_stem(&derived)?;
            if sources.contains(&source) {
                continue;
            }

            info!("Removing stale image: {}", derived.display());
            if self.config.dry_run {
                report.removed.push(derived);
                continue;
            }

            let mirror = resolver.mirror_path(&derived);
            let mirror_exists = self.config.resolve(&mirror).is_file();
            if !mirror_exists && !self.config.tolerate_missing_mirror {
                return Err(CompressError::MissingMirror(mirror));
            }

            fs::remove_file(self.config.resolve(&derived)).await?;
            if mirror_exists {
                fs::remove_file(self.config.resolve(&mirror)).await?;
            } else {
                warn!("Mirrored file already gone: {}", mirror.display());
            }

            debug!("Removed {} (source {} missing)", derived.display(), source.display());
            report.removed.push(derived);
        }

        Ok(report)
    }
}
