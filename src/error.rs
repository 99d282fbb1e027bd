//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `IllegalFileName`: File sorgente che porta già il suffisso di compressione
//! - `InvalidPath`: Path non UTF-8 o fuori dalle root configurate
//! - `ToolSpawn` / `ToolFailed` / `ToolTimeout`: Fallimenti dei tool esterni
//! - `MissingTool`: Tool esterno non trovato prima dell'avvio
//! - `MissingMirror`: Copia nel sito renderizzato mancante durante il prune
//! - `Config`: Errori di validazione configurazione
//! - `TaskPanicked`: Un task del worker pool è andato in panic
//!
//! Nessun errore viene ritentato o declassato a warning: ogni variante
//! termina il run con exit status non-zero.
//!
//! ## Esempio:
//! ```ignore
//! if stem.ends_with(&config.suffix) {
//!     return Err(CompressError::IllegalFileName(path.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Custom error types for asset compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Illegal file name ending for compression: {}", .0.display())]
    IllegalFileName(PathBuf),

    #[error("Invalid asset path: {0}")]
    InvalidPath(String),

    #[error("Failed to start {program}: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ToolFailed { program: String, status: String },

    #[error("{program} timed out after {timeout:?}")]
    ToolTimeout { program: String, timeout: Duration },

    #[error("Dependency missing: {}", .0.display())]
    MissingTool(PathBuf),

    #[error("Mirrored file missing: {}", .0.display())]
    MissingMirror(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task panicked: {0}")]
    TaskPanicked(String),
}
