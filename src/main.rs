//! # Site Asset Compressor - Main Entry Point
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione (file JSON + override da CLI)
//! - Avvio dell'optimizer; ogni errore termina il processo con status non-zero
//!
//! ## Esempio di utilizzo:
//! ```bash
//! asset-compressor . --site-dir _site --workers 4 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use site_asset_compressor::{Config, SiteOptimizer};

#[derive(Parser)]
#[command(name = "asset-compressor")]
#[command(about = "Compress site images, patch rendered HTML and prune stale derivatives")]
struct Args {
    /// Project root (defaults to the current directory)
    root: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source asset directory, relative to the root
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Derived-output directory, relative to the root
    #[arg(long)]
    derived_dir: Option<PathBuf>,

    /// Rendered site directory, relative to the root
    #[arg(long)]
    site_dir: Option<PathBuf>,

    /// svgo binary
    #[arg(long)]
    svgo: Option<PathBuf>,

    /// squoosh-cli binary
    #[arg(long)]
    squoosh: Option<PathBuf>,

    /// Number of parallel workers (default: half the CPUs)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Timeout for each tool invocation, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Dry run - log what would happen without touching files
    #[arg(long)]
    dry_run: bool,

    /// Warn instead of failing when a stale file has no copy in the site
    #[arg(long)]
    tolerate_missing_mirror: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(assets_dir) = self.assets_dir {
            config.assets_dir = assets_dir;
        }
        if let Some(derived_dir) = self.derived_dir {
            config.derived_dir = derived_dir;
        }
        if let Some(site_dir) = self.site_dir {
            config.site_dir = site_dir;
        }
        if let Some(svgo) = self.svgo {
            config.svgo = svgo;
        }
        if let Some(squoosh) = self.squoosh {
            config.squoosh = squoosh;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.tool_timeout_secs = timeout;
        }
        config.dry_run |= self.dry_run;
        config.tolerate_missing_mirror |= self.tolerate_missing_mirror;
        if self.no_progress {
            config.show_progress = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => Config::from_required_file(path).await?,
        None => Config::default(),
    };
    let config = args.apply(config);

    if !config.root.is_dir() {
        return Err(anyhow::anyhow!("Project root does not exist: {}", config.root.display()));
    }

    let optimizer = SiteOptimizer::with_process_runner(config)?;
    optimizer.run().await?;

    Ok(())
}
