//! # Site Asset Compressor Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione immutabile e validazione parametri
//! - `error`: Tipi di errore custom
//! - `file_manager`: Discovery dei file e classificazione asset
//! - `image_processor`: Generazione varianti compresse (svgo / squoosh-cli)
//! - `html_patcher`: Sostituzione riferimenti a output rotti nell'HTML
//! - `pruner`: Rimozione derivati stale
//! - `tool_runner`: Invocazione dei tool esterni con timeout
//! - `optimizer`: Orchestratore principale del processo
//! - `progress`: Progress bar e statistiche
//!
//! ## Utilizzo:
//! ```ignore
//! use site_asset_compressor::{Config, SiteOptimizer};
//!
//! let optimizer = SiteOptimizer::with_process_runner(Config::default())?;
//! let report = optimizer.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod html_patcher;
pub mod image_processor;
pub mod optimizer;
pub mod progress;
pub mod pruner;
pub mod tool_runner;
pub mod utils;

#[cfg(test)]
mod test_helpers;

pub use config::Config;
pub use error::CompressError;
pub use optimizer::{RunReport, SiteOptimizer};
