//! Stratum Core - the execution core of a recipe-driven scaffolder.
//!
//! A recipe names a project and an ordered list of modules. Each module
//! resolves to a blueprint: a declarative list of actions that create files,
//! merge manifests and configs, rewrite source modules and run commands.
//! Every write lands in a virtual file system first; the project is only
//! written to disk once every module has succeeded.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           stratum-cli (CLI)             │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   Orchestrator / BlueprintService       │
//! │   BlueprintInterpreter -> FileEngine    │
//! │   -> VirtualFileSystem                  │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   Ports: Filesystem, BlueprintRegistry, │
//! │   CommandRunner, DependencyInstaller    │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      stratum-adapters (Infrastructure)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stratum_core::prelude::*;
//!
//! # fn wire(
//! #     blueprints: Arc<dyn BlueprintRegistry>,
//! #     storage: Arc<dyn Filesystem>,
//! #     runner: Arc<dyn CommandRunner>,
//! # ) {
//! let recipe = Recipe::new(ProjectMeta::new("shop"))
//!     .with_module(ModuleSpec::new("nextjs", "framework"))
//!     .with_module(ModuleSpec::new("drizzle", "database"));
//!
//! let orchestrator = Orchestrator::new(blueprints, storage, runner);
//! let report = orchestrator.run(&recipe, "./shop", RunOptions::default());
//! assert!(report.success);
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        BlueprintInterpreter, BlueprintService, FileEngine, Modifier, ModifierRegistry,
        Orchestrator, RunOptions, VirtualFileSystem,
        ports::{BlueprintRegistry, CommandRunner, DependencyInstaller, Filesystem},
    };
    pub use crate::domain::{
        Action, Blueprint, ModuleSpec, ModuleStatus, ProjectContext, ProjectMeta, Recipe,
        RunReport,
    };
    pub use crate::error::{StratumError, StratumResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
