//! Domain layer for Stratum.
//!
//! Pure logic over in-memory values: recipes, blueprints and their actions,
//! the template processor, structured merges and the source-module model.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No I/O**: no filesystem, process or network access
//! - **Synchronous**: every operation completes in place
//! - **Immutable inputs**: recipes and blueprints are never mutated while a run executes

pub mod entities;
pub mod error;
pub mod manifest;
pub mod merge;
pub mod source_module;

mod validation;

pub use entities::{
    Action, Blueprint, FallbackPolicy, ModuleReport, ModuleResult, ModuleSpec, ModuleStatus,
    OperationResult, ProjectContext, ProjectMeta, Recipe, RunReport, SchemaColumn, SchemaTable,
    common::RelativePath,
    recipe::{DEFAULT_MANIFEST, FRAMEWORK_CATEGORY},
};
pub use error::{DomainError, ErrorCategory};
pub use manifest::PackageSpec;
pub use merge::{ArrayPolicy, DocumentFormat, EnvEntry, MergeStrategy};
pub use source_module::{ImportSpec, ParsedModule};
pub use validation::DomainValidator;
