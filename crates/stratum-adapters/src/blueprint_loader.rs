//! Filesystem-based blueprint loader.
//!
//! Discovers blueprint documents under a directory tree and decodes them into
//! domain [`Blueprint`] objects.
//!
//! # Directory layout expected
//!
//! ```text
//! blueprints/
//! ├── framework/
//! │   └── nextjs.yaml
//! ├── database/
//! │   ├── drizzle.json
//! │   └── README.md            ← ignored (not a document format)
//! └── monitoring/
//!     └── sentry.toml
//! ```
//!
//! # Document format
//!
//! Any `.json`, `.yaml`/`.yml` or `.toml` file whose top level is a table
//! with both `id` and `actions` is a blueprint:
//!
//! ```yaml
//! id: drizzle
//! name: Drizzle ORM
//! version: 0.30.0
//! actions:
//!   - type: INSTALL_PACKAGES
//!     packages: [drizzle-orm]
//!   - type: CREATE_FILE
//!     path: "{{paths.db}}/index.ts"
//!     content: "export const db = drizzle();\n"
//! ```
//!
//! Other documents (shared fragments, tool configs) are skipped. A document
//! with the envelope but a malformed action list is an error.

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use stratum_core::{
    application::ApplicationError,
    domain::{Blueprint, DocumentFormat},
    error::StratumResult,
};

use crate::blueprint_store::InMemoryStore;

/// Environment variable naming the blueprint directory.
pub const BLUEPRINTS_DIR_ENV: &str = "STRATUM_BLUEPRINTS_DIR";

const DEFAULT_DIR_NAME: &str = "blueprints";

/// Locate the blueprint directory.
///
/// Order: `explicit`, `$STRATUM_BLUEPRINTS_DIR`, `./blueprints`, then
/// `blueprints/` next to the running executable. An explicit or environment
/// path is returned even if it does not exist so the caller can report it.
pub fn discover_blueprints_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir.to_path_buf());
    }

    if let Some(dir) = env::var_os(BLUEPRINTS_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }

    let local = PathBuf::from(DEFAULT_DIR_NAME);
    if local.is_dir() {
        return Some(local);
    }

    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join(DEFAULT_DIR_NAME)))
        .filter(|dir| dir.is_dir())
}

/// Loads [`Blueprint`] objects from a directory tree.
///
/// # Example
///
/// ```no_run
/// use stratum_adapters::FilesystemBlueprintLoader;
///
/// let loader = FilesystemBlueprintLoader::new("./blueprints");
/// let blueprints = loader.load_all()?;
/// println!("Loaded {} blueprints", blueprints.len());
/// # Ok::<(), stratum_core::error::StratumError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemBlueprintLoader {
    dir: PathBuf,
}

impl FilesystemBlueprintLoader {
    /// Create a loader pointed at `dir`.
    ///
    /// The directory does not need to exist yet; [`Self::load_all`] reports it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every blueprint under the directory, in path order.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::BlueprintLoad`] if:
    /// - the directory does not exist or cannot be walked
    /// - a blueprint document has invalid actions
    /// - two documents declare the same id
    ///
    /// Documents that cannot be parsed at all are skipped with a `WARN` log.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn load_all(&self) -> StratumResult<Vec<Blueprint>> {
        if !self.dir.is_dir() {
            return Err(self.error(&self.dir, "directory not found"));
        }

        let mut blueprints = Vec::new();
        let mut origins: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry.map_err(|e| self.error(&self.dir, e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(format) =
                DocumentFormat::from_extension(path.extension().and_then(|e| e.to_str()))
            else {
                continue;
            };

            let Some(blueprint) = self.load_file(path, format)? else {
                continue;
            };

            if let Some(previous) = origins.get(&blueprint.id) {
                return Err(self.error(
                    path,
                    format!(
                        "duplicate blueprint id '{}' (already defined in {})",
                        blueprint.id,
                        previous.display()
                    ),
                ));
            }

            debug!(
                id = %blueprint.id,
                actions = blueprint.actions.len(),
                "loaded blueprint"
            );
            origins.insert(blueprint.id.clone(), path.to_path_buf());
            blueprints.push(blueprint);
        }

        debug!(count = blueprints.len(), "finished loading blueprints");
        Ok(blueprints)
    }

    /// Load every blueprint into a fresh [`InMemoryStore`].
    pub fn load_store(&self) -> StratumResult<InMemoryStore> {
        InMemoryStore::from_blueprints(self.load_all()?)
    }

    fn load_file(&self, path: &Path, format: DocumentFormat) -> StratumResult<Option<Blueprint>> {
        let raw = fs::read_to_string(path).map_err(|e| self.error(path, e))?;

        let document = match format.parse(&path.display().to_string(), &raw) {
            Ok(document) => document,
            Err(e) => {
                // One unreadable document must not block the others.
                warn!(file = %path.display(), error = %e, "skipping unparseable document");
                return Ok(None);
            }
        };

        if !is_blueprint_envelope(&document) {
            debug!(file = %path.display(), "no blueprint envelope, skipping");
            return Ok(None);
        }

        Blueprint::from_value(document)
            .map(Some)
            .map_err(|e| self.error(path, e))
    }

    fn error(
        &self,
        path: &Path,
        reason: impl std::fmt::Display,
    ) -> stratum_core::error::StratumError {
        ApplicationError::BlueprintLoad {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
        .into()
    }
}

fn is_blueprint_envelope(document: &Value) -> bool {
    document.get("id").is_some_and(Value::is_string) && document.get("actions").is_some()
}
