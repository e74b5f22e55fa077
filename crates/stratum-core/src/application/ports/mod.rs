//! Application ports (traits) for external dependencies.
//!
//! Ports define what the execution core needs from the outside world.
//! Adapters in `stratum-adapters` implement them.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: called by the core, implemented by infrastructure
//!   - `Filesystem`: real storage behind the VFS
//!   - `BlueprintRegistry`: blueprint lookup by module id
//!   - `CommandRunner`: external processes for `RUN_COMMAND`
//!   - `DependencyInstaller`: post-flush package installation
//!
//! - **Driving (Input) Ports**: the `Orchestrator` service, called by the CLI

pub mod output;

pub use output::{
    BlueprintRegistry, CommandInvocation, CommandOutput, CommandRunner, DependencyInstaller,
    Filesystem,
};

#[cfg(test)]
pub use output::{MockCommandRunner, MockDependencyInstaller, MockFilesystem};
