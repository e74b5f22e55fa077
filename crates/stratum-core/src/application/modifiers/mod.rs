//! Modifier Registry: named structured-rewrite strategies for `ENHANCE_FILE`.
//!
//! A modifier reads the current content through the [`FileEngine`], computes
//! the new content and writes it back through the same engine. Modifiers
//! never see real storage.

mod config_merger;
mod env_merger;
mod json_merger;
mod module_enhancer;

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::application::engine::FileEngine;
use crate::domain::{DomainError, OperationResult, ProjectContext};

pub use config_merger::ConfigMerger;
pub use env_merger::EnvMerger;
pub use json_merger::JsonMerger;
pub use module_enhancer::ModuleEnhancer;

/// A structured-editing strategy.
pub trait Modifier: Send + Sync {
    /// Registry key, e.g. `json-merger`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn apply(
        &self,
        engine: &mut FileEngine<'_>,
        path: &str,
        params: &Value,
        ctx: &ProjectContext,
    ) -> OperationResult;
}

/// Name -> modifier map, fixed once the orchestrator is built.
#[derive(Clone, Default)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, Arc<dyn Modifier>>,
}

impl ModifierRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the four built-in modifiers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(JsonMerger)
            .register(ModuleEnhancer)
            .register(ConfigMerger)
            .register(EnvMerger);
        registry
    }

    /// Add or replace a modifier under its own name.
    pub fn register(&mut self, modifier: impl Modifier + 'static) -> &mut Self {
        self.modifiers
            .insert(modifier.name().to_string(), Arc::new(modifier));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Modifier>> {
        self.modifiers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.contains_key(name)
    }

    /// `(name, description)` pairs sorted by name.
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .modifiers
            .values()
            .map(|m| (m.name().to_string(), m.description().to_string()))
            .collect();
        entries.sort();
        entries
    }

    pub fn names(&self) -> Vec<String> {
        self.describe().into_iter().map(|(name, _)| name).collect()
    }
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &self.names())
            .finish()
    }
}

/// Decode modifier parameters; `null` is treated as an empty object.
pub(crate) fn parse_params<T: DeserializeOwned>(
    modifier: &str,
    params: &Value,
) -> Result<T, DomainError> {
    let value = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params.clone()
    };
    serde_json::from_value(value).map_err(|e| DomainError::MalformedAction {
        action: format!("ENHANCE_FILE ({modifier})"),
        reason: e.to_string(),
    })
}
