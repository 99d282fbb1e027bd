//! # Site Task Module
//!
//! Worker per i singoli task del pool: compressione di un asset o patch di
//! una pagina HTML. I task sono indipendenti e non condividono stato mutabile.

use crate::{
    error::CompressError,
    html_patcher::HtmlPatcher,
    image_processor::{CompressReport, ImageProcessor},
    optimizer::path_resolver::file_stem,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One unit of work submitted to the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteTask {
    /// Compress `dir/file_name`
    Compress { dir: PathBuf, file_name: String },
    /// Patch a rendered HTML page
    Patch { page: PathBuf },
}

impl SiteTask {
    /// Split a root-relative asset path into a compression task
    pub fn compress(asset: &Path) -> Result<Self, CompressError> {
        let file_name = asset
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CompressError::InvalidPath(format!("Invalid file name: {}", asset.display())))?;
        Ok(Self::Compress {
            dir: asset.parent().unwrap_or(Path::new("")).to_path_buf(),
            file_name: file_name.to_string(),
        })
    }

    pub fn patch(page: &Path) -> Self {
        Self::Patch {
            page: page.to_path_buf(),
        }
    }

    /// Short label for progress messages
    pub fn label(&self) -> String {
        match self {
            Self::Compress { file_name, .. } => file_name.clone(),
            Self::Patch { page } => file_stem(page)
                .map(|stem| format!("{}.html", stem))
                .unwrap_or_else(|_| page.display().to_string()),
        }
    }
}

/// What a finished task did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Compressed(CompressReport),
    Patched(bool),
}

/// Executes site tasks
#[derive(Clone)]
pub struct TaskWorker {
    image_processor: ImageProcessor,
    html_patcher: HtmlPatcher,
}

impl TaskWorker {
    pub fn new(image_processor: ImageProcessor, html_patcher: HtmlPatcher) -> Self {
        Self {
            image_processor,
            html_patcher,
        }
    }

    pub async fn run(&self, task: &SiteTask) -> Result<TaskOutcome, CompressError> {
        debug!("Starting task: {:?}", task);
        match task {
            SiteTask::Compress { dir, file_name } => self
                .image_processor
                .compress(dir, file_name)
                .await
                .map(TaskOutcome::Compressed),
            SiteTask::Patch { page } => self.html_patcher.patch(page).await.map(TaskOutcome::Patched),
        }
    }
}
