pub mod blueprint;
pub mod common;
pub mod context;
pub mod outcome;
pub mod recipe;

pub use crate::domain::DomainError;
pub use blueprint::{Action, Blueprint, FallbackPolicy, SchemaColumn, SchemaTable};
pub use context::ProjectContext;
pub use outcome::{ModuleReport, ModuleResult, ModuleStatus, OperationResult, RunReport};
pub use recipe::{ModuleSpec, ProjectMeta, Recipe};
