// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (reports keep copies)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("Invalid blueprint '{blueprint}': {reason}")]
    InvalidBlueprint { blueprint: String, reason: String },

    #[error("Malformed {action} action: {reason}")]
    MalformedAction { action: String, reason: String },

    #[error("Unknown action type '{kind}'")]
    UnknownAction { kind: String },

    #[error("Duplicate module id in recipe: {id}")]
    DuplicateModule { id: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path escapes the project root: {path}")]
    PathEscapesRoot { path: String },

    #[error("Invalid package specifier '{spec}'")]
    InvalidPackageSpec { spec: String },

    // ========================================================================
    // Document Errors
    // ========================================================================
    #[error("Could not parse {format} document '{path}': {reason}")]
    InvalidDocument {
        path: String,
        format: &'static str,
        reason: String,
    },

    #[error("Expected {expected} at '{path}'")]
    UnexpectedShape { path: String, expected: &'static str },

    // ========================================================================
    // Constraint Violations
    // ========================================================================
    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("Illegal module status transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl DomainError {
    pub(crate) fn malformed(action: &str, reason: impl Into<String>) -> Self {
        Self::MalformedAction {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidRecipe(msg) => vec![
                "Check the recipe document".into(),
                format!("Details: {}", msg),
            ],
            Self::MalformedAction { action, .. } => vec![
                format!("A {} action in the blueprint is missing required data", action),
                "Run: stratum validate <recipe> to check every blueprint".into(),
            ],
            Self::UnknownAction { kind } => vec![
                format!("'{}' is not a recognised action type", kind),
                "Supported: CREATE_FILE, OVERWRITE_FILE, APPEND_TO_FILE, PREPEND_TO_FILE, \
                 REPLACE_IN_FILE, INSTALL_PACKAGES, ADD_SCRIPT, ADD_ENV_VAR, MERGE_JSON, \
                 MERGE_CONFIG, ENHANCE_FILE, ADD_IMPORTS, APPEND_STATEMENTS, WRAP_EXPORT, \
                 EXTEND_SCHEMA, RUN_COMMAND"
                    .into(),
            ],
            Self::DuplicateModule { id } => vec![
                format!("Module '{}' appears more than once", id),
                "Each module may only be listed once per recipe".into(),
            ],
            Self::AbsolutePathNotAllowed { .. } | Self::PathEscapesRoot { .. } => vec![
                "Blueprint paths must stay inside the generated project".into(),
                "Use a path relative to the project root".into(),
            ],
            Self::InvalidPackageSpec { spec } => vec![
                format!("Could not read package '{}'", spec),
                "Use 'name', 'name@version' or '@scope/name@version'".into(),
            ],
            Self::InvalidDocument { path, .. } => vec![
                format!("'{}' exists but is not valid", path),
                "Fix the file by hand or remove it and re-run".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRecipe(_)
            | Self::InvalidBlueprint { .. }
            | Self::MalformedAction { .. }
            | Self::UnknownAction { .. }
            | Self::DuplicateModule { .. }
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathEscapesRoot { .. }
            | Self::InvalidPackageSpec { .. }
            | Self::MissingRequiredField { .. } => ErrorCategory::Validation,
            Self::InvalidDocument { .. } | Self::UnexpectedShape { .. } => {
                ErrorCategory::Compatibility
            }
            Self::InvalidTransition { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Internal,
}
