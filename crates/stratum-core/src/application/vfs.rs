//! Virtual file system: the in-memory overlay for one generation run.
//!
//! Every write lands in an ordered operation log and in a path -> content
//! state map. Reads hit the state first and fall through to real storage.
//! Nothing touches storage until [`VirtualFileSystem::flush`], which consumes
//! the VFS so a run can commit at most once. Dropping the VFS discards it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::ports::Filesystem;
use crate::domain::RelativePath;
use crate::error::StratumResult;

/// How a write combines with existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Write only if the path does not exist yet.
    Create,
    Overwrite,
    Append,
    Prepend,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Overwrite => "overwrite",
            Self::Append => "append",
            Self::Prepend => "prepend",
        };
        write!(f, "{s}")
    }
}

/// Whether a write changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// `Create` on a path that already existed.
    Unchanged,
}

/// One entry of the operation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub path: RelativePath,
    pub mode: WriteMode,
    /// Content of the path after this entry.
    pub content: String,
    pub seq: u64,
}

pub struct VirtualFileSystem {
    root: PathBuf,
    storage: Arc<dyn Filesystem>,
    log: Vec<LogEntry>,
    state: BTreeMap<RelativePath, String>,
}

impl VirtualFileSystem {
    pub fn new(root: impl Into<PathBuf>, storage: Arc<dyn Filesystem>) -> Self {
        Self {
            root: root.into(),
            storage,
            log: Vec::new(),
            state: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the project root already exists on real storage.
    pub fn root_exists(&self) -> bool {
        self.storage.exists(&self.root)
    }

    /// In the log, or present on real storage.
    pub fn exists(&self, path: &RelativePath) -> bool {
        self.state.contains_key(path) || self.storage.exists(&path.under(&self.root))
    }

    /// Current content: log state first, then real storage.
    pub fn read(&self, path: &RelativePath) -> StratumResult<Option<String>> {
        match self.state.get(path) {
            Some(content) => Ok(Some(content.clone())),
            None => self.storage.read_to_string(&path.under(&self.root)),
        }
    }

    pub fn write(
        &mut self,
        path: &RelativePath,
        content: &str,
        mode: WriteMode,
    ) -> StratumResult<WriteOutcome> {
        let next = match mode {
            WriteMode::Create => {
                if self.exists(path) {
                    debug!(path = %path, "create skipped, path exists");
                    return Ok(WriteOutcome::Unchanged);
                }
                content.to_string()
            }
            WriteMode::Overwrite => content.to_string(),
            WriteMode::Append => {
                let mut current = self.read(path)?.unwrap_or_default();
                current.push_str(content);
                current
            }
            WriteMode::Prepend => {
                let current = self.read(path)?.unwrap_or_default();
                format!("{content}{current}")
            }
        };

        self.record(path, mode, next);
        Ok(WriteOutcome::Written)
    }

    fn record(&mut self, path: &RelativePath, mode: WriteMode, content: String) {
        let seq = self.log.len() as u64;
        debug!(path = %path, %mode, seq, "vfs write");
        self.log.push(LogEntry {
            path: path.clone(),
            mode,
            content: content.clone(),
            seq,
        });
        self.state.insert(path.clone(), content);
    }

    /// Every path written during the run, sorted.
    pub fn all_files(&self) -> Vec<String> {
        self.state.keys().map(|p| p.to_string()).collect()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Commit every logged path to real storage. Returns the paths written.
    #[instrument(skip_all, fields(root = %self.root.display(), files = self.state.len()))]
    pub fn flush(self) -> StratumResult<Vec<String>> {
        self.storage.create_dir_all(&self.root)?;

        let mut written = Vec::with_capacity(self.state.len());
        for (path, content) in &self.state {
            let target = path.under(&self.root);
            if let Some(parent) = target.parent() {
                self.storage.create_dir_all(parent)?;
            }
            self.storage.write_file(&target, content)?;
            written.push(path.to_string());
        }

        info!(files = written.len(), "VFS flushed");
        Ok(written)
    }
}

impl fmt::Debug for VirtualFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFileSystem")
            .field("root", &self.root)
            .field("entries", &self.log.len())
            .field("files", &self.state.len())
            .finish()
    }
}
