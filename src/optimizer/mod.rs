//! # Optimizer Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `site_optimizer`: Orchestratore principale (dispatch, raccolta, prune)
//! - `task`: Worker per singoli task del pool
//! - `path_resolver`: Mapping bidirezionale sorgente ↔ derivato

pub mod path_resolver;
pub mod site_optimizer;
pub mod task;

pub use path_resolver::PathResolver;
pub use site_optimizer::{RunReport, SiteOptimizer};
pub use task::{SiteTask, TaskOutcome, TaskWorker};
