//! Infrastructure adapters for Stratum.
//!
//! This crate implements the ports defined in `stratum-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod blueprint_loader;
pub mod blueprint_store;
pub mod filesystem;
pub mod process;
pub mod recipe_loader;

// Re-export commonly used adapters
pub use blueprint_loader::{BLUEPRINTS_DIR_ENV, FilesystemBlueprintLoader, discover_blueprints_dir};
pub use blueprint_store::InMemoryStore;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use process::{PackageManager, PackageManagerInstaller, SystemCommandRunner};
pub use recipe_loader::load_recipe;
