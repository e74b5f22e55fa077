//! Results reported by the engine, the interpreter and the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Outcome of one File Modification Engine primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub success: bool,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok(file_path: impl Into<String>) -> Self {
        Self {
            success: true,
            file_path: file_path.into(),
            error: None,
        }
    }

    pub fn failed(file_path: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            file_path: file_path.into(),
            error: Some(error.to_string()),
        }
    }
}

/// Files touched and problems collected while running one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub files: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ModuleResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a touched file once, in first-touch order.
    pub fn touch(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    /// Fold an engine result in, handing back the failure message.
    pub fn absorb(&mut self, result: OperationResult) -> Result<(), String> {
        if result.success {
            self.touch(result.file_path);
            Ok(())
        } else {
            let message = result.error.unwrap_or_else(|| "operation failed".to_string());
            Err(format!("{}: {}", result.file_path, message))
        }
    }

    /// Append another result, keeping file order and dropping duplicates.
    pub fn extend(&mut self, other: ModuleResult) {
        for file in other.files {
            self.touch(file);
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Lifecycle of a module within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl ModuleStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// `PENDING -> RUNNING -> SUCCEEDED | FAILED`; nothing else.
    pub fn transition(self, to: Self) -> Result<Self, DomainError> {
        match (self, to) {
            (Self::Pending, Self::Running)
            | (Self::Running, Self::Succeeded)
            | (Self::Running, Self::Failed) => Ok(to),
            _ => Err(DomainError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Per-module entry of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub id: String,
    pub category: String,
    pub status: ModuleStatus,
    pub files: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ModuleReport {
    pub fn pending(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            status: ModuleStatus::Pending,
            files: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn advance(&mut self, to: ModuleStatus) -> Result<(), DomainError> {
        self.status = self.status.transition(to)?;
        Ok(())
    }
}

/// Everything the orchestrator reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub success: bool,
    pub dry_run: bool,
    pub modules_executed: usize,
    pub modules: Vec<ModuleReport>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Paths committed to storage, or planned in a dry run.
    pub files_written: Vec<String>,
}

impl RunReport {
    pub fn failed_module(&self) -> Option<&ModuleReport> {
        self.modules
            .iter()
            .find(|m| m.status == ModuleStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_the_lifecycle() {
        let status = ModuleStatus::Pending
            .transition(ModuleStatus::Running)
            .and_then(|s| s.transition(ModuleStatus::Succeeded))
            .unwrap();
        assert!(status.is_terminal());

        assert!(ModuleStatus::Pending.transition(ModuleStatus::Succeeded).is_err());
        assert!(ModuleStatus::Failed.transition(ModuleStatus::Running).is_err());
        assert!(ModuleStatus::Succeeded.transition(ModuleStatus::Failed).is_err());
    }

    #[test]
    fn module_result_absorbs_engine_results() {
        let mut result = ModuleResult::default();
        assert!(result.absorb(OperationResult::ok("a.ts")).is_ok());
        assert!(result.absorb(OperationResult::ok("a.ts")).is_ok());
        assert_eq!(
            result.absorb(OperationResult::failed("b.json", "not an object")),
            Err("b.json: not an object".to_string())
        );

        assert_eq!(result.files, vec!["a.ts"]);
        assert!(result.success());
    }

    #[test]
    fn report_serialises_camel_case() {
        let report = RunReport {
            run_id: "r".into(),
            success: true,
            dry_run: false,
            modules_executed: 1,
            modules: vec![],
            errors: vec![],
            warnings: vec![],
            files_written: vec![],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["modulesExecuted"], 1);
        assert!(value.get("filesWritten").is_some());
    }
}
