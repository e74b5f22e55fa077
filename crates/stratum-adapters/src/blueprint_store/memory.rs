//! In-memory blueprint store.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use stratum_core::{
    application::{ApplicationError, ports::BlueprintRegistry},
    domain::{Blueprint, DomainValidator as validator},
    error::StratumResult,
};

/// Thread-safe in-memory blueprint store, keyed by module id.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<BTreeMap<String, Blueprint>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `blueprints`. Later ids replace earlier ones.
    pub fn from_blueprints(blueprints: impl IntoIterator<Item = Blueprint>) -> StratumResult<Self> {
        let store = Self::new();
        for blueprint in blueprints {
            store.insert(blueprint)?;
        }
        Ok(store)
    }

    /// Get the number of blueprints.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    /// Check if store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("blueprints", &self.len())
            .finish()
    }
}

impl BlueprintRegistry for InMemoryStore {
    fn get(&self, id: &str) -> StratumResult<Blueprint> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        inner.get(id).cloned().ok_or_else(|| {
            ApplicationError::BlueprintNotFound { id: id.to_string() }.into()
        })
    }

    fn list(&self) -> StratumResult<Vec<Blueprint>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        Ok(inner.values().cloned().collect())
    }

    fn insert(&self, blueprint: Blueprint) -> StratumResult<()> {
        // Validate before insertion
        validator::validate_blueprint(&blueprint)?;

        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        inner.insert(blueprint.id.clone(), blueprint);
        Ok(())
    }
}
