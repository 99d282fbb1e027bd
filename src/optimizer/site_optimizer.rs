//! # Site Optimizer Main Orchestrator
//!
//! Orchestratore principale: enumera il lavoro, lo distribuisce sul worker
//! pool e lancia il prune solo quando il pool è completamente drenato.
//!
//! ## Flusso di esecuzione:
//! 1. **Discovery**: tutti i file sotto `assets_dir`, le pagine `.html` sotto `site_dir`
//! 2. **Naming guard**: un nome illegale blocca il run prima di qualsiasi tool
//! 3. **Dependency check**: svgo / squoosh-cli solo se servono
//! 4. **Parallel processing**: un task per asset e uno per pagina, limitati da semaforo
//! 5. **Raccolta**: si attendono tutti i task, poi si propaga il primo errore
//! 6. **Prune**: sequenziale, dopo che ogni task è terminato con successo

use crate::{
    config::Config,
    error::CompressError,
    file_manager::{AssetKind, FileManager},
    html_patcher::HtmlPatcher,
    image_processor::ImageProcessor,
    optimizer::{
        path_resolver::PathResolver,
        task::{SiteTask, TaskOutcome, TaskWorker},
    },
    progress::{ProgressManager, RunStats},
    pruner::Pruner,
    tool_runner::{ProcessRunner, ToolRunner},
};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// Outcome of a full run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stats: RunStats,
    /// Derived files removed by the prune pass
    pub pruned: Vec<PathBuf>,
}

/// Orchestratore principale
pub struct SiteOptimizer {
    config: Arc<Config>,
    runner: Arc<dyn ToolRunner>,
}

impl SiteOptimizer {
    /// Crea nuova istanza con un runner arbitrario
    pub fn new(config: Config, runner: Arc<dyn ToolRunner>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            runner,
        })
    }

    /// Crea nuova istanza che lancia processi reali
    pub fn with_process_runner(config: Config) -> Result<Self> {
        let runner = Arc::new(ProcessRunner::new(config.root.clone(), config.tool_timeout()));
        Self::new(config, runner)
    }

    /// Run the whole pipeline: compress and patch in parallel, then prune
    pub async fn run(&self) -> Result<RunReport> {
        let config = &self.config;
        info!("Starting asset compression in: {}", config.root.display());
        info!("🔧 Workers: {}, tool timeout: {:?}", config.workers, config.tool_timeout());
        if config.dry_run {
            info!("🧪 Dry run mode: No files will be modified");
        }

        let assets = FileManager::find_files(&config.root, &config.assets_dir)?;
        let pages = FileManager::find_html_files(&config.root, &config.site_dir)?;
        info!("Found {} assets and {} HTML pages", assets.len(), pages.len());

        // Il guard va controllato prima di lanciare qualsiasi tool
        let resolver = PathResolver::new(config);
        for asset in assets.iter().filter(|a| AssetKind::classify(a).is_some()) {
            resolver.check_source_name(asset)?;
        }

        self.check_dependencies(&assets)?;

        // Solo le immagini diventano task: il resto dell'albero è ignorato
        let mut tasks = assets
            .iter()
            .filter(|asset| AssetKind::classify(asset).is_some())
            .map(|asset| SiteTask::compress(asset))
            .collect::<Result<Vec<_>, _>>()?;
        tasks.extend(pages.iter().map(|page| SiteTask::patch(page)));

        let mut stats = self.run_tasks(tasks).await?;

        let pruned = Pruner::new(config).prune().await?;
        stats.files_pruned = pruned.removed.len();

        info!("✅ {}", stats.format_summary());
        Ok(RunReport {
            stats,
            pruned: pruned.removed,
        })
    }

    /// Verifica che i tool necessari siano disponibili
    fn check_dependencies(&self, assets: &[PathBuf]) -> Result<(), CompressError> {
        if self.config.dry_run {
            return Ok(());
        }

        let kinds: Vec<AssetKind> = assets.iter().filter_map(|a| AssetKind::classify(a)).collect();
        let needed = [
            (AssetKind::Vector, &self.config.svgo),
            (AssetKind::Raster, &self.config.squoosh),
        ];

        for (kind, tool) in needed {
            if kinds.contains(&kind) && !self.runner.is_available(tool) {
                error!("Required tool not found: {}", tool.display());
                return Err(CompressError::MissingTool(tool.clone()));
            }
        }
        Ok(())
    }

    /// Dispatch every task on the bounded pool and wait for all of them.
    ///
    /// A failing task doesn't cancel the others; the first failure in
    /// submission order is returned once everything has finished.
    async fn run_tasks(&self, tasks: Vec<SiteTask>) -> Result<RunStats> {
        let progress = ProgressManager::new(tasks.len() as u64, self.config.show_progress);
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let worker = Arc::new(TaskWorker::new(
            ImageProcessor::new(self.config.clone(), self.runner.clone()),
            HtmlPatcher::new(self.config.clone()),
        ));

        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let permit = semaphore.clone().acquire_owned().await?;
            let worker = worker.clone();
            let progress = progress.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit; // Keep permit alive
                let result = worker.run(&task).await;

                let message = match &result {
                    Ok(_) => format!("✅ {}", task.label()),
                    Err(_) => format!("❌ {}: error", task.label()),
                };
                progress.update(&message);
                result
            }));
        }

        let mut stats = RunStats::new();
        let mut first_error: Option<CompressError> = None;

        for result in futures::future::join_all(handles).await {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(join_error) => Err(CompressError::TaskPanicked(join_error.to_string())),
            };

            match outcome {
                Ok(TaskOutcome::Compressed(report)) => {
                    stats.outputs_generated += report.generated.len();
                    stats.outputs_skipped += report.skipped.len();
                }
                Ok(TaskOutcome::Patched(changed)) => {
                    if changed {
                        stats.pages_patched += 1;
                    }
                }
                Err(e) => {
                    stats.errors += 1;
                    error!("Task failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        progress.finish(&stats.format_summary());

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(stats),
        }
    }
}
