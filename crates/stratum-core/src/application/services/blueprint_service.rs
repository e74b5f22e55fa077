//! Blueprint Service - blueprint management and pre-flight checks.
//!
//! Separated from the orchestrator so the CLI can list, inspect and
//! validate without running anything.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    application::{ApplicationError, modifiers::ModifierRegistry, ports::BlueprintRegistry},
    domain::{Action, Blueprint, DomainValidator, Recipe},
    error::StratumResult,
};

/// Blueprint metadata for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlueprintInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub action_count: usize,
}

impl From<&Blueprint> for BlueprintInfo {
    fn from(b: &Blueprint) -> Self {
        Self {
            id: b.id.clone(),
            name: b.name.clone(),
            version: b.version.clone(),
            description: b.description.clone(),
            action_count: b.actions.len(),
        }
    }
}

pub struct BlueprintService {
    registry: Arc<dyn BlueprintRegistry>,
}

impl BlueprintService {
    pub fn new(registry: Arc<dyn BlueprintRegistry>) -> Self {
        Self { registry }
    }

    pub fn get(&self, id: &str) -> StratumResult<Blueprint> {
        self.registry.get(id)
    }

    /// Add or replace a blueprint after validating it.
    pub fn save(&self, blueprint: Blueprint) -> StratumResult<()> {
        DomainValidator::validate_blueprint(&blueprint)?;
        self.registry.insert(blueprint)
    }

    /// All blueprints, sorted by id.
    pub fn list(&self) -> StratumResult<Vec<BlueprintInfo>> {
        let mut infos: Vec<BlueprintInfo> =
            self.registry.list()?.iter().map(BlueprintInfo::from).collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(infos)
    }

    /// Check a recipe without executing it.
    ///
    /// Fails on structural problems or a module with no blueprint. References to
    /// unregistered modifiers come back as warnings since a fallback policy may
    /// still let the run succeed.
    pub fn check_recipe(
        &self,
        recipe: &Recipe,
        modifiers: &ModifierRegistry,
    ) -> StratumResult<Vec<String>> {
        DomainValidator::validate_recipe(recipe)?;

        let mut warnings = Vec::new();
        for module in &recipe.modules {
            let blueprint = self.registry.get(&module.id)?;
            DomainValidator::validate_blueprint(&blueprint)?;

            for action in &blueprint.actions {
                if let Action::EnhanceFile { modifier, .. } = action {
                    if !modifiers.contains(modifier) {
                        warnings.push(format!(
                            "[{}] {}",
                            module.id,
                            ApplicationError::ModifierNotFound {
                                name: modifier.clone()
                            }
                        ));
                    }
                }
            }
        }
        Ok(warnings)
    }
}
