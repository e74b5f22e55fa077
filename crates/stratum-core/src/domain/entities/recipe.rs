//! Recipe: the declarative input of one generation run.
//!
//! A recipe names the project and lists the technology modules to apply, in
//! order. It is consumed once at the start of a run and never mutated.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::DomainError;

/// Default dependency manifest at the project root.
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Module category whose parameters may declare the path table.
pub const FRAMEWORK_CATEGORY: &str = "framework";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub project: ProjectMeta,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

/// Project metadata section of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,

    /// Output directory. Relative paths are resolved by the caller.
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub description: Option<String>,

    /// Identifier of the target framework (e.g. "nextjs").
    #[serde(default)]
    pub framework: Option<String>,

    /// Manifest file name, relative to the root.
    #[serde(default)]
    pub manifest: Option<String>,

    /// Overrides for the framework-declared path table.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
}

impl ProjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: None,
            description: None,
            framework: None,
            manifest: None,
            paths: BTreeMap::new(),
        }
    }

    pub fn manifest_path(&self) -> &str {
        self.manifest.as_deref().unwrap_or(DEFAULT_MANIFEST)
    }
}

/// One technology module scheduled by the recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSpec {
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

fn default_version() -> String {
    "latest".to_string()
}

impl ModuleSpec {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            version: default_version(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn is_framework(&self) -> bool {
        self.category == FRAMEWORK_CATEGORY
    }
}

impl Recipe {
    pub fn new(project: ProjectMeta) -> Self {
        Self {
            project,
            modules: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: ModuleSpec) -> Self {
        self.modules.push(module);
        self
    }

    /// Structural checks run before any module executes.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.project.name.trim().is_empty() {
            return Err(DomainError::InvalidRecipe(
                "project name cannot be empty".into(),
            ));
        }

        if self.modules.is_empty() {
            return Err(DomainError::InvalidRecipe(
                "recipe must list at least one module".into(),
            ));
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.id.trim().is_empty() {
                return Err(DomainError::InvalidRecipe("module id cannot be empty".into()));
            }
            if !seen.insert(module.id.as_str()) {
                return Err(DomainError::DuplicateModule {
                    id: module.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// The path table: framework-declared entries, overridden by the recipe.
    pub fn path_table(&self) -> BTreeMap<String, String> {
        let mut table = BTreeMap::new();

        if let Some(Value::Object(declared)) = self
            .modules
            .iter()
            .find(|m| m.is_framework())
            .and_then(|m| m.parameters.get("paths"))
        {
            for (key, value) in declared {
                if let Some(s) = value.as_str() {
                    table.insert(key.clone(), s.to_string());
                }
            }
        }

        for (key, value) in &self.project.paths {
            table.insert(key.clone(), value.clone());
        }

        table
    }
}
