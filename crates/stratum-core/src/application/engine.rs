//! File Modification Engine: typed primitives over the VFS.
//!
//! Every primitive reports an [`OperationResult`] instead of an error; the
//! interpreter decides what a failure means for the module.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::application::vfs::{VirtualFileSystem, WriteMode, WriteOutcome};
use crate::domain::merge::{self, ArrayPolicy, DocumentFormat, EnvEntry, MergeStrategy};
use crate::domain::{DomainError, OperationResult, ParsedModule, RelativePath};
use crate::error::{StratumError, StratumResult};

pub struct FileEngine<'a> {
    vfs: &'a mut VirtualFileSystem,
}

impl<'a> FileEngine<'a> {
    pub fn new(vfs: &'a mut VirtualFileSystem) -> Self {
        Self { vfs }
    }

    pub fn vfs(&self) -> &VirtualFileSystem {
        &*self.vfs
    }

    /// Invalid paths never exist.
    pub fn exists(&self, path: &str) -> bool {
        RelativePath::try_new(path).is_ok_and(|p| self.vfs.exists(&p))
    }

    pub fn read(&self, path: &str) -> StratumResult<Option<String>> {
        let path = RelativePath::try_new(path)?;
        self.vfs.read(&path)
    }

    /// Create a file. Without `overwrite`, an existing file is left untouched
    /// and the call still succeeds.
    pub fn create_file(&mut self, path: &str, content: &str, overwrite: bool) -> OperationResult {
        let mode = if overwrite {
            WriteMode::Overwrite
        } else {
            WriteMode::Create
        };
        self.write(path, content, mode)
    }

    pub fn overwrite_file(&mut self, path: &str, content: &str) -> OperationResult {
        self.write(path, content, WriteMode::Overwrite)
    }

    /// Append, creating the file when missing.
    pub fn append_to_file(&mut self, path: &str, content: &str) -> OperationResult {
        self.write(path, content, WriteMode::Append)
    }

    /// Prepend, creating the file when missing.
    pub fn prepend_to_file(&mut self, path: &str, content: &str) -> OperationResult {
        self.write(path, content, WriteMode::Prepend)
    }

    /// Deep-merge `partial` into a JSON document; a missing file starts as `{}`.
    #[instrument(skip(self, partial))]
    pub fn merge_json_file(
        &mut self,
        path: &str,
        partial: &Value,
        policy: ArrayPolicy,
    ) -> OperationResult {
        self.report(path, |engine, rel| {
            let mut document = engine.load_document(rel, DocumentFormat::Json)?;
            merge::deep_merge(&mut document, partial, policy);
            engine.store_document(rel, DocumentFormat::Json, &document)
        })
    }

    /// Merge into a JSON, YAML or TOML config file chosen by extension.
    #[instrument(skip(self, partial))]
    pub fn merge_config_file(
        &mut self,
        path: &str,
        partial: &Value,
        strategy: MergeStrategy,
    ) -> OperationResult {
        self.report(path, |engine, rel| {
            let format = DocumentFormat::from_extension(rel.extension().as_deref()).ok_or(
                DomainError::UnexpectedShape {
                    path: rel.to_string(),
                    expected: "a .json, .yaml, .yml or .toml file",
                },
            )?;
            if format == DocumentFormat::Toml {
                let current = engine.vfs.read(rel)?.unwrap_or_default();
                let merged = merge::merge_toml(rel.as_str(), &current, partial, strategy)?;
                return engine.put(rel, &merged);
            }
            let document = engine.load_document(rel, format)?;
            let merged = merge::merge_with_strategy(document, partial, strategy);
            engine.store_document(rel, format, &merged)
        })
    }

    /// Replace-or-append env variables; a missing file is created.
    pub fn merge_env_file(&mut self, path: &str, entries: &[EnvEntry]) -> OperationResult {
        self.report(path, |engine, rel| {
            let current = engine.vfs.read(rel)?.unwrap_or_default();
            let merged = merge::merge_env(&current, entries);
            engine.put(rel, &merged)
        })
    }

    /// Rewrite an existing text file.
    pub fn modify_text_file<F>(&mut self, path: &str, transform: F) -> OperationResult
    where
        F: FnOnce(String) -> Result<String, DomainError>,
    {
        self.report(path, |engine, rel| {
            let current = engine.require(rel)?;
            let next = transform(current.clone())?;
            if next != current {
                engine.put(rel, &next)?;
            }
            Ok(())
        })
    }

    /// Parse a source module, run a pure transform on it and write it back.
    ///
    /// With `create_missing`, an absent file is treated as an empty module;
    /// otherwise it is an error. The file is only rewritten when the rendered
    /// output differs.
    pub fn modify_module_file<F>(
        &mut self,
        path: &str,
        create_missing: bool,
        transform: F,
    ) -> OperationResult
    where
        F: FnOnce(ParsedModule) -> Result<ParsedModule, DomainError>,
    {
        self.report(path, |engine, rel| {
            let current = if create_missing {
                engine.vfs.read(rel)?.unwrap_or_default()
            } else {
                engine.require(rel)?
            };

            let module = transform(ParsedModule::parse(&current)).map_err(|e| match e {
                DomainError::UnexpectedShape { expected, .. } => DomainError::UnexpectedShape {
                    path: rel.to_string(),
                    expected,
                },
                other => other,
            })?;

            let rendered = module.render();
            if rendered != current || !engine.vfs.exists(rel) {
                engine.put(rel, &rendered)?;
            } else {
                debug!(path = %rel, "module unchanged");
            }
            Ok(())
        })
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn write(&mut self, path: &str, content: &str, mode: WriteMode) -> OperationResult {
        self.report(path, |engine, rel| {
            if engine.vfs.write(rel, content, mode)? == WriteOutcome::Unchanged {
                debug!(path = %rel, "file exists, left untouched");
            }
            Ok(())
        })
    }

    fn put(&mut self, path: &RelativePath, content: &str) -> StratumResult<()> {
        self.vfs.write(path, content, WriteMode::Overwrite).map(|_| ())
    }

    fn require(&self, path: &RelativePath) -> StratumResult<String> {
        self.vfs.read(path)?.ok_or_else(|| {
            ApplicationError::TargetMissing {
                path: path.to_string(),
            }
            .into()
        })
    }

    fn load_document(&self, path: &RelativePath, format: DocumentFormat) -> StratumResult<Value> {
        let content = self.vfs.read(path)?.unwrap_or_default();
        let document = format.parse(path.as_str(), &content)?;
        match document {
            Value::Object(_) => Ok(document),
            // An empty YAML document parses as null.
            Value::Null => Ok(Value::Object(Map::new())),
            _ => Err(DomainError::UnexpectedShape {
                path: path.to_string(),
                expected: "a top-level object",
            }
            .into()),
        }
    }

    fn store_document(
        &mut self,
        path: &RelativePath,
        format: DocumentFormat,
        document: &Value,
    ) -> StratumResult<()> {
        let rendered = format.render(path.as_str(), document)?;
        self.put(path, &rendered)
    }

    /// Normalise the path, run `op` and fold the outcome into a result.
    fn report<F>(&mut self, path: &str, op: F) -> OperationResult
    where
        F: FnOnce(&mut Self, &RelativePath) -> StratumResult<()>,
    {
        let rel = match RelativePath::try_new(path) {
            Ok(rel) => rel,
            Err(e) => return OperationResult::failed(path, e),
        };

        match op(self, &rel) {
            Ok(()) => OperationResult::ok(rel.as_str()),
            Err(e) => {
                debug!(path = %rel, error = %e, "engine operation failed");
                OperationResult::failed(rel.as_str(), display_error(&e))
            }
        }
    }
}

/// Innermost message without the layer prefix.
fn display_error(error: &StratumError) -> String {
    match error {
        StratumError::Domain(e) => e.to_string(),
        StratumError::Application(e) => e.to_string(),
        other => other.to_string(),
    }
}
