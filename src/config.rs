//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con layout delle directory, tool e formati
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default allineati al layout del sito
//!
//! ## Parametri di configurazione:
//! - `root`: Root del progetto da cui si risolvono tutti i path relativi
//! - `assets_dir` / `derived_dir` / `site_dir`: Layout delle tre directory
//! - `suffix`: Marker dei file compressi (default: "-min")
//! - `raster_formats`: Formati target per immagini raster (jpg, webp, avif)
//! - `broken_outputs`: Output noti come rotti, mai generati
//! - `svgo_overrides`: Config svgo specifica per singoli asset
//! - `workers`: Numero di worker paralleli (default: metà delle CPU, minimo 1)
//! - `tool_timeout_secs`: Timeout per ogni invocazione esterna (default: 90)
//!
//! La configurazione è immutabile una volta avviato il run: viene condivisa
//! via `Arc` con ogni task, niente stato globale.
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     workers: 8,
//!     dry_run: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::CompressError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// A raster target: output extension plus the encoder flag passed to the recompressor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterFormat {
    pub extension: String,
    pub encoder: String,
}

impl RasterFormat {
    pub fn new(extension: &str, encoder: &str) -> Self {
        Self {
            extension: extension.to_string(),
            encoder: encoder.to_string(),
        }
    }
}

/// Configuration for a compression run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project root; every other path is relative to it
    pub root: PathBuf,
    /// Source asset tree
    pub assets_dir: PathBuf,
    /// Derived-output tree, nested inside `assets_dir`
    pub derived_dir: PathBuf,
    /// Rendered site tree mirroring derived outputs
    pub site_dir: PathBuf,
    /// Marker appended to the stem of every compressed derivative
    pub suffix: String,
    /// Raster targets, ordered from most to least compatible
    pub raster_formats: Vec<RasterFormat>,
    /// Derived outputs the recompressor is known to break on
    pub broken_outputs: Vec<PathBuf>,
    /// Per-asset svgo config overrides
    pub svgo_overrides: BTreeMap<PathBuf, PathBuf>,
    /// Vector minifier binary
    pub svgo: PathBuf,
    /// Raster recompressor binary
    pub squoosh: PathBuf,
    /// Number of parallel workers
    pub workers: usize,
    /// Timeout for each external tool invocation, in seconds
    pub tool_timeout_secs: u64,
    /// Dry run - log what would happen without touching files
    pub dry_run: bool,
    /// Warn instead of failing when a pruned file has no mirrored copy
    pub tolerate_missing_mirror: bool,
    /// Show the progress bar
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        let mut svgo_overrides = BTreeMap::new();
        svgo_overrides.insert(
            PathBuf::from("assets/projects/ftzz/scheduling-order.svg"),
            PathBuf::from(".build/assets-projects-ftzz-scheduling-order.svgo.config.js"),
        );

        Self {
            root: PathBuf::from("."),
            assets_dir: PathBuf::from("assets"),
            derived_dir: PathBuf::from("assets/resized"),
            site_dir: PathBuf::from("_site"),
            suffix: "-min".to_string(),
            raster_formats: vec![
                RasterFormat::new("jpg", "mozjpeg"),
                RasterFormat::new("webp", "webp"),
                RasterFormat::new("avif", "avif"),
            ],
            // The recompressor crashes on this one; drop once upstream fixes it
            broken_outputs: vec![
                PathBuf::from("assets/resized/future/final-stop-resolution-min.avif"),
                PathBuf::from("assets/resized/future/final-stop-resolution-min.webp"),
                PathBuf::from("assets/resized/future/final-stop-resolution-min.jpg"),
            ],
            svgo_overrides,
            svgo: PathBuf::from(".build/node_modules/.bin/svgo"),
            squoosh: PathBuf::from(".build/node_modules/.bin/squoosh-cli"),
            workers: default_workers(),
            tool_timeout_secs: 90,
            dry_run: false,
            tolerate_missing_mirror: false,
            show_progress: true,
        }
    }
}

/// Half of the available processing units, never less than one
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), CompressError> {
        if self.workers == 0 {
            return Err(CompressError::Config("Number of workers must be greater than 0".into()));
        }

        if self.tool_timeout_secs == 0 {
            return Err(CompressError::Config("Tool timeout must be greater than 0".into()));
        }

        if self.suffix.is_empty() {
            return Err(CompressError::Config("Compression suffix must not be empty".into()));
        }

        if self.derived_dir == self.assets_dir || !self.derived_dir.starts_with(&self.assets_dir) {
            return Err(CompressError::Config(format!(
                "Derived directory {} must live inside assets directory {}",
                self.derived_dir.display(),
                self.assets_dir.display()
            )));
        }

        if self.raster_formats.is_empty() {
            return Err(CompressError::Config("At least one raster format is required".into()));
        }

        Ok(())
    }

    /// Timeout applied to every external tool invocation
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Resolve a root-relative path against the project root
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Whether a derived output is on the known-broken list
    pub fn is_broken(&self, output: &Path) -> bool {
        self.broken_outputs.iter().any(|broken| broken == output)
    }

    /// Load configuration from file, falling back to defaults when it is absent
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file not found, using defaults: {}", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file named explicitly by the user; it must exist
    pub async fn from_required_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CompressError::Config(format!("Config file not found: {}", path.display())).into());
        }
        Self::from_file(path).await
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
