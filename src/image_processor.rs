//! # Image Processing Module
//!
//! Questo modulo genera le varianti compresse di ogni asset immagine
//! delegando tutto il lavoro a tool esterni.
//!
//! ## Formati
//!
//! | Input            | Output                          | Tool        |
//! |------------------|---------------------------------|-------------|
//! | SVG              | `<stem>-min.svg` (minificato)   | svgo        |
//! | PNG / JPG / JPEG | `<stem>-min.{jpg,webp,avif}`    | squoosh-cli |
//! | Altri            | ignorati                        | -           |
//!
//! ## Pipeline per file
//!
//! 1. **Rilevamento formato**: estensione, altrimenti il file è ignorato
//! 2. **Naming guard**: un sorgente fuori da `resized` con suffisso `-min` è un errore fatale
//! 3. **Skip derivati**: file che portano già il suffisso non vengono ricompressi
//! 4. **Check esistenza**: output già presenti o noti come rotti non vengono rigenerati
//! 5. **Invocazione tool**: timeout fisso, nessun retry
//! 6. **Mirror**: copia dell'output nel sito renderizzato
//!
//! ## Esempio
//!
//! ```text
//! Input:  assets/icons/logo.png
//! Output: assets/resized/icons/logo-min.jpg   -> _site/assets/resized/icons/logo-min.jpg
//!         assets/resized/icons/logo-min.webp  -> _site/assets/resized/icons/logo-min.webp
//!         assets/resized/icons/logo-min.avif  -> _site/assets/resized/icons/logo-min.avif
//! ```

use crate::args;
use crate::config::{Config, RasterFormat};
use crate::error::CompressError;
use crate::file_manager::{AssetKind, FileManager};
use crate::optimizer::path_resolver::{file_stem, PathResolver};
use crate::tool_runner::{ToolCommand, ToolRunner};
use crate::utils::path_arg;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Outputs touched while compressing one asset
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompressReport {
    /// Outputs generated (or that would be, in dry-run mode)
    pub generated: Vec<PathBuf>,
    /// Outputs left alone because they exist or are known to be broken
    pub skipped: Vec<PathBuf>,
}

/// Generates compressed derivatives of image assets
#[derive(Clone)]
pub struct ImageProcessor {
    config: Arc<Config>,
    runner: Arc<dyn ToolRunner>,
}

impl ImageProcessor {
    pub fn new(config: Arc<Config>, runner: Arc<dyn ToolRunner>) -> Self {
        Self { config, runner }
    }

    /// Compress `dir/file_name`, a root-relative asset.
    ///
    /// # Errors
    /// - `IllegalFileName` if a source asset already carries the compression suffix
    /// - any tool failure or timeout, unretried
    /// - I/O errors while mirroring
    pub async fn compress(&self, dir: &Path, file_name: &str) -> Result<CompressReport, CompressError> {
        let input = dir.join(file_name);

        let Some(kind) = AssetKind::classify(&input) else {
            return Ok(CompressReport::default());
        };

        let resolver = PathResolver::new(&self.config);
        resolver.check_source_name(&input)?;

        if resolver.has_suffix(file_stem(&input)?) {
            debug!("Already compressed, skipping: {}", input.display());
            return Ok(CompressReport::default());
        }

        match kind {
            AssetKind::Vector => self.compress_vector(&input, &resolver).await,
            AssetKind::Raster => self.compress_raster(&input, &resolver).await,
        }
    }

    async fn compress_vector(
        &self,
        input: &Path,
        resolver: &PathResolver<'_>,
    ) -> Result<CompressReport, CompressError> {
        let mut report = CompressReport::default();
        let output = resolver.derived_path(input, "svg")?;

        if self.config.resolve(&output).exists() {
            debug!("Output exists: {}", output.display());
            report.skipped.push(output);
            return Ok(report);
        }

        let mut args = args![path_arg(input)?, "--multipass", "--output", path_arg(&output)?];
        if let Some(override_config) = self.config.svgo_overrides.get(input) {
            args.extend(args!["--config", path_arg(override_config)?]);
        }

        let command = ToolCommand::new(&self.config.svgo, args, &output);
        self.generate(command, resolver).await?;
        report.generated.push(output);
        Ok(report)
    }

    async fn compress_raster(
        &self,
        input: &Path,
        resolver: &PathResolver<'_>,
    ) -> Result<CompressReport, CompressError> {
        let mut report = CompressReport::default();
        let output_dir = resolver.output_dir(input)?;

        for format in &self.config.raster_formats {
            let output = resolver.derived_path(input, &format.extension)?;

            if self.config.is_broken(&output) {
                debug!("Known broken output, skipping: {}", output.display());
                report.skipped.push(output);
                continue;
            }
            if self.config.resolve(&output).exists() {
                debug!("Output exists: {}", output.display());
                report.skipped.push(output);
                continue;
            }

            let command = ToolCommand::new(
                &self.config.squoosh,
                self.squoosh_args(input, &output_dir, format)?,
                &output,
            );
            self.generate(command, resolver).await?;
            report.generated.push(output);
        }

        Ok(report)
    }

    fn squoosh_args(
        &self,
        input: &Path,
        output_dir: &Path,
        format: &RasterFormat,
    ) -> Result<Vec<String>, CompressError> {
        Ok(args![
            path_arg(input)?,
            "--output-dir",
            path_arg(output_dir)?,
            "--suffix",
            self.config.suffix.as_str(),
            format!("--{}", format.encoder).as_str(),
            "true",
        ])
    }

    /// Run the tool for one output, then mirror it into the rendered site
    async fn generate(&self, command: ToolCommand, resolver: &PathResolver<'_>) -> Result<(), CompressError> {
        let output = &command.output;
        info!("Generating {}", output.display());

        if self.config.dry_run {
            info!("🧪 Dry run: would run {} {:?}", command.name(), command.args);
            return Ok(());
        }

        if let Some(parent) = self.config.resolve(output).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.runner.run(&command).await?;

        let mirror = resolver.mirror_path(output);
        FileManager::copy_with_parents(&self.config.resolve(output), &self.config.resolve(&mirror)).await?;

        info!("Done processing {}", output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::project;
    use crate::tool_runner::testing::RecordingRunner;

    fn processor(config: Config, runner: &Arc<RecordingRunner>) -> ImageProcessor {
        ImageProcessor::new(Arc::new(config), runner.clone())
    }

    #[tokio::test]
    async fn test_raster_generates_three_formats_and_mirrors() {
        let (temp, config) = project(&["assets/icons/logo.png"]);
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        let report = processor.compress(Path::new("assets/icons"), "logo.png").await.unwrap();

        assert_eq!(
            report.generated,
            vec![
                PathBuf::from("assets/resized/icons/logo-min.jpg"),
                PathBuf::from("assets/resized/icons/logo-min.webp"),
                PathBuf::from("assets/resized/icons/logo-min.avif"),
            ]
        );
        for output in &report.generated {
            assert!(temp.path().join(output).exists());
            assert!(temp.path().join("_site").join(output).exists());
        }

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0].args,
            vec![
                "assets/icons/logo.png",
                "--output-dir",
                "assets/resized/icons",
                "--suffix",
                "-min",
                "--mozjpeg",
                "true",
            ]
        );
        assert_eq!(calls[2].args[5], "--avif");
    }

    #[tokio::test]
    async fn test_second_run_invokes_nothing() {
        let (temp, config) = project(&["assets/icons/logo.png", "assets/diagram.svg"]);
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        processor.compress(Path::new("assets/icons"), "logo.png").await.unwrap();
        processor.compress(Path::new("assets"), "diagram.svg").await.unwrap();
        assert_eq!(runner.call_count(), 4);

        let again = processor.compress(Path::new("assets/icons"), "logo.png").await.unwrap();
        processor.compress(Path::new("assets"), "diagram.svg").await.unwrap();
        assert_eq!(runner.call_count(), 4);
        assert!(again.generated.is_empty());
        assert_eq!(again.skipped.len(), 3);
    }

    #[tokio::test]
    async fn test_vector_single_output_keeps_extension() {
        let (temp, config) = project(&["assets/diagrams/flow.svg"]);
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        let report = processor.compress(Path::new("assets/diagrams"), "flow.svg").await.unwrap();

        assert_eq!(report.generated, vec![PathBuf::from("assets/resized/diagrams/flow-min.svg")]);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].args,
            vec![
                "assets/diagrams/flow.svg",
                "--multipass",
                "--output",
                "assets/resized/diagrams/flow-min.svg",
            ]
        );
        assert!(temp.path().join("_site/assets/resized/diagrams/flow-min.svg").exists());
    }

    #[tokio::test]
    async fn test_vector_override_config() {
        let (temp, config) = project(&["assets/projects/ftzz/scheduling-order.svg"]);
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        processor
            .compress(Path::new("assets/projects/ftzz"), "scheduling-order.svg")
            .await
            .unwrap();

        let args = &runner.calls()[0].args;
        assert_eq!(
            &args[4..],
            ["--config", ".build/assets-projects-ftzz-scheduling-order.svgo.config.js"]
        );
    }

    #[tokio::test]
    async fn test_naming_guard_fails_before_invocation() {
        let (temp, config) = project(&["assets/icons/logo-min.png"]);
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        let result = processor.compress(Path::new("assets/icons"), "logo-min.png").await;
        assert!(matches!(result, Err(CompressError::IllegalFileName(_))));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_derived_files_and_other_extensions_are_skipped() {
        let (temp, config) = project(&[
            "assets/resized/icons/logo-min.jpg",
            "assets/fonts/body.woff2",
        ]);
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        let derived = processor.compress(Path::new("assets/resized/icons"), "logo-min.jpg").await.unwrap();
        let font = processor.compress(Path::new("assets/fonts"), "body.woff2").await.unwrap();

        assert_eq!(derived, CompressReport::default());
        assert_eq!(font, CompressReport::default());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsuffixed_file_in_derived_tree_compresses_in_place() {
        let (temp, config) = project(&["assets/resized/future/poster.png"]);
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        let report = processor.compress(Path::new("assets/resized/future"), "poster.png").await.unwrap();

        assert_eq!(report.generated[0], PathBuf::from("assets/resized/future/poster-min.jpg"));
        assert_eq!(runner.calls()[0].args[2], "assets/resized/future");
    }

    #[tokio::test]
    async fn test_broken_outputs_are_not_generated() {
        let (temp, mut config) = project(&["assets/icons/logo.png"]);
        config.broken_outputs = vec![PathBuf::from("assets/resized/icons/logo-min.avif")];
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        let report = processor.compress(Path::new("assets/icons"), "logo.png").await.unwrap();

        assert_eq!(report.generated.len(), 2);
        assert_eq!(report.skipped, vec![PathBuf::from("assets/resized/icons/logo-min.avif")]);
        assert_eq!(runner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_tool_failure_is_terminal() {
        let (temp, config) = project(&["assets/icons/logo.png"]);
        let runner = Arc::new(RecordingRunner::failing_on(temp.path(), "logo-min.webp"));
        let processor = processor(config, &runner);

        let result = processor.compress(Path::new("assets/icons"), "logo.png").await;

        assert!(matches!(result, Err(CompressError::ToolFailed { .. })));
        // jpg went through, avif was never attempted
        assert_eq!(runner.call_count(), 2);
        assert!(!temp.path().join("_site/assets/resized/icons/logo-min.webp").exists());
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let (temp, mut config) = project(&["assets/icons/logo.png"]);
        config.dry_run = true;
        let runner = Arc::new(RecordingRunner::new(temp.path()));
        let processor = processor(config, &runner);

        let report = processor.compress(Path::new("assets/icons"), "logo.png").await.unwrap();

        assert_eq!(report.generated.len(), 3);
        assert_eq!(runner.call_count(), 0);
        assert!(!temp.path().join("assets/resized").exists());
    }
}
