//! # External Tool Runner
//!
//! Questo modulo incapsula l'invocazione dei tool esterni (svgo, squoosh-cli).
//!
//! ## Responsabilità:
//! - `ToolCommand`: descrizione di una invocazione (programma, argomenti, output atteso)
//! - `ToolRunner`: trait al confine con il processo esterno, sostituibile nei test
//! - `ProcessRunner`: implementazione reale con `tokio::process` e timeout fisso
//! - Risoluzione dei tool: path relativo alla root del progetto o ricerca nel `PATH`
//!
//! ## Error handling:
//! - Spawn fallito → `ToolSpawn`
//! - Exit status non-zero → `ToolFailed`
//! - Timeout → `ToolTimeout` (il processo viene killato)
//! - Nessun retry: ogni fallimento è terminale per il task

use crate::error::CompressError;
use async_trait::async_trait;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// A single external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Binary to run, root-relative or a bare name looked up in `PATH`
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Root-relative file the tool is expected to produce
    pub output: PathBuf,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            output: output.into(),
        }
    }

    /// Short program name for log lines
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Runs external tools on behalf of the compressor
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `command` to completion; any failure is terminal
    async fn run(&self, command: &ToolCommand) -> Result<(), CompressError>;

    /// Whether `program` can be invoked at all
    fn is_available(&self, _program: &Path) -> bool {
        true
    }
}

/// Spawns real processes from the project root
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    root: PathBuf,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    /// Paths with a directory component resolve against the root, bare names go through `PATH`
    fn resolve_program(&self, program: &Path) -> PathBuf {
        if program.is_relative() && program.components().count() > 1 {
            self.root.join(program)
        } else {
            program.to_path_buf()
        }
    }
}

/// Find tool in system PATH
fn find_in_system_path(tool_name: &Path) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(tool_name))
        .find(|path| path.is_file())
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn is_available(&self, program: &Path) -> bool {
        let resolved = self.resolve_program(program);
        if resolved.components().count() > 1 || resolved.is_absolute() {
            return resolved.is_file();
        }
        find_in_system_path(program).is_some()
    }

    async fn run(&self, command: &ToolCommand) -> Result<(), CompressError> {
        let program = self.resolve_program(&command.program);
        debug!("Running {} {:?}", program.display(), command.args);

        let start_time = Instant::now();
        let mut child = Command::new(&program)
            .args(&command.args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CompressError::ToolSpawn {
                program: command.name(),
                source,
            })?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(CompressError::ToolTimeout {
                    program: command.name(),
                    timeout: self.timeout,
                });
            }
        };

        if !status.success() {
            return Err(CompressError::ToolFailed {
                program: command.name(),
                status: status.to_string(),
            });
        }

        if !self.root.join(&command.output).exists() {
            return Err(CompressError::ToolFailed {
                program: command.name(),
                status: format!("no output at {}", command.output.display()),
            });
        }

        debug!("{} finished in {:?}", command.name(), start_time.elapsed());
        Ok(())
    }
}
