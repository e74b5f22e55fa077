//! Application layer errors.
//!
//! These errors represent failures while executing a run (storage access,
//! lookups, external processes), not malformed input. Input errors are
//! `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// No blueprint is registered for a module id.
    #[error("No blueprint registered for module '{id}'")]
    BlueprintNotFound { id: String },

    /// Blueprint documents could not be loaded.
    #[error("Failed to load blueprints from {path}: {reason}")]
    BlueprintLoad { path: PathBuf, reason: String },

    /// `ENHANCE_FILE` named a modifier nobody registered.
    #[error("Modifier '{name}' is not registered")]
    ModifierNotFound { name: String },

    /// A file an action needs to rewrite does not exist.
    #[error("Target file '{path}' does not exist")]
    TargetMissing { path: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// An external process could not be started.
    #[error("Failed to start '{command}': {reason}")]
    CommandSpawn { command: String, reason: String },

    /// An external process exited unsuccessfully.
    #[error("'{command}' exited with {}", describe_exit(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Dependency installation failed.
    #[error("Dependency installation failed: {reason}")]
    InstallFailed { reason: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("Blueprint store error")]
    StoreLockError,

    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ApplicationError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::FilesystemError {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::BlueprintNotFound { id } => vec![
                format!("No blueprint with id '{}' was found", id),
                "Try: stratum list to see available blueprints".into(),
                "Or point at a blueprint directory with --blueprints".into(),
            ],
            Self::BlueprintLoad { path, .. } => vec![
                format!("Check the blueprint files under {}", path.display()),
                "Run: stratum validate <recipe> for a detailed report".into(),
            ],
            Self::ModifierNotFound { name } => vec![
                format!("'{}' is not a known modifier", name),
                "Try: stratum list --modifiers".into(),
                "Or set `fallback` on the ENHANCE_FILE action".into(),
            ],
            Self::TargetMissing { path } => vec![
                format!("An earlier module should have created '{}'", path),
                "Check the module order in the recipe".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
            Self::CommandSpawn { command, .. } => vec![
                format!("Is '{}' installed and on PATH?", command),
            ],
            Self::CommandFailed { stderr, .. } if !stderr.trim().is_empty() => vec![
                format!("Command output: {}", stderr.trim()),
            ],
            Self::InstallFailed { .. } => vec![
                "The project was generated; install dependencies manually".into(),
            ],
            Self::StoreLockError => vec![
                "The blueprint store is locked".into(),
                "Try again in a moment".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BlueprintNotFound { .. }
            | Self::ModifierNotFound { .. }
            | Self::TargetMissing { .. } => ErrorCategory::NotFound,
            Self::BlueprintLoad { .. } => ErrorCategory::Configuration,
            Self::FilesystemError { .. } | Self::StoreLockError => ErrorCategory::Internal,
            Self::CommandSpawn { .. } | Self::CommandFailed { .. } | Self::InstallFailed { .. } => {
                ErrorCategory::Compatibility
            }
            Self::ValidationFailed(_) => ErrorCategory::Validation,
        }
    }
}
