//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche del run.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` sui task del worker pool
//! - Tracking degli output generati, saltati, pagine patchate e file rimossi
//! - Riepilogo finale su una sola riga
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:42] [========================================] 212/212 (100%) ✅ logo.png
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for dispatched tasks
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager; a hidden bar when `visible` is false
    pub fn new(total_tasks: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_tasks);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics for one compression run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub outputs_generated: usize,
    pub outputs_skipped: usize,
    pub pages_patched: usize,
    pub files_pruned: usize,
    pub errors: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Generated: {} | Up to date: {} | Pages patched: {} | Pruned: {} | Errors: {}",
            self.outputs_generated,
            self.outputs_skipped,
            self.pages_patched,
            self.files_pruned,
            self.errors
        )
    }
}
