//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "run a recipe" or "check a recipe".

pub mod blueprint_service;
pub mod orchestrator;

pub use blueprint_service::{BlueprintInfo, BlueprintService};
pub use orchestrator::{Orchestrator, RUN_RECORD_FILE, RunOptions};
