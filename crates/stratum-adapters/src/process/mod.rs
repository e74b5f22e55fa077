//! External process adapters.

mod command;
mod installer;

pub use command::SystemCommandRunner;
pub use installer::{PackageManager, PackageManagerInstaller};
