//! Application layer for Stratum.
//!
//! This layer contains:
//! - **Execution core**: the VFS, the file modification engine, the modifier
//!   registry and the blueprint interpreter
//! - **Services**: use case orchestration (Orchestrator, BlueprintService)
//! - **Ports**: interface definitions (traits) for external dependencies
//! - **Errors**: application-specific error types
//!
//! Document formats, import rewriting and action decoding live in
//! `crate::domain`; this layer sequences them against storage.

pub mod engine;
pub mod error;
pub mod interpreter;
pub mod modifiers;
pub mod ports;
pub mod services;
pub mod vfs;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::FileEngine;
pub use interpreter::BlueprintInterpreter;
pub use modifiers::{Modifier, ModifierRegistry};
pub use services::{BlueprintInfo, BlueprintService, Orchestrator, RUN_RECORD_FILE, RunOptions};
pub use vfs::{LogEntry, VirtualFileSystem, WriteMode, WriteOutcome};

// Re-export port traits (for adapter implementation)
pub use ports::{
    BlueprintRegistry, CommandInvocation, CommandOutput, CommandRunner, DependencyInstaller,
    Filesystem,
};

pub use error::ApplicationError;
