//! Driven (output) ports - implemented by infrastructure.

use std::path::{Path, PathBuf};

use crate::domain::Blueprint;
use crate::error::StratumResult;

/// Port for real storage.
///
/// Implemented by:
/// - `stratum_adapters::filesystem::LocalFilesystem` (production)
/// - `stratum_adapters::filesystem::MemoryFilesystem` (testing)
///
/// The VFS reads through this port on a cache miss and writes through it only
/// when flushed.
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Read a file; `Ok(None)` when it does not exist.
    fn read_to_string(&self, path: &Path) -> StratumResult<Option<String>>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StratumResult<()>;

    /// Write content to a file, replacing it.
    fn write_file(&self, path: &Path, content: &str) -> StratumResult<()>;
}

/// Port for blueprint storage and retrieval.
///
/// Implemented by:
/// - `stratum_adapters::blueprint_store::InMemoryBlueprintStore`
pub trait BlueprintRegistry: Send + Sync {
    /// Get the blueprint for a module id.
    fn get(&self, id: &str) -> StratumResult<Blueprint>;

    /// List all blueprints, ordered by id.
    fn list(&self) -> StratumResult<Vec<Blueprint>>;

    /// Insert or replace a blueprint.
    fn insert(&self, blueprint: Blueprint) -> StratumResult<()>;
}

/// A process to start: program plus argument vector, never a shell string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// `program arg1 arg2`, for logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished process reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Port for running external processes.
///
/// `Err` means the process could not be started; a started process that
/// exits non-zero is reported through [`CommandOutput::exit_code`].
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &CommandInvocation) -> StratumResult<CommandOutput>;
}

/// Port for installing the dependencies declared in a generated manifest.
#[cfg_attr(test, mockall::automock)]
pub trait DependencyInstaller: Send + Sync {
    fn install(&self, project_root: &Path) -> StratumResult<()>;
}
