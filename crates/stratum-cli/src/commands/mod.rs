//! Command handlers, one module per subcommand.
//!
//! Handlers translate parsed arguments into calls on `stratum-core` services
//! wired with `stratum-adapters`, then render the result.

use std::path::Path;

use tracing::debug;

use stratum_adapters::{FilesystemBlueprintLoader, InMemoryStore, discover_blueprints_dir};

use crate::{
    config::AppConfig,
    error::{CliError, CliResult},
};

pub mod completions;
pub mod config;
pub mod generate;
pub mod init;
pub mod list;
pub mod validate;

/// Load every blueprint from the first directory that applies:
/// `--blueprints`, then `blueprints.dir` from config, then discovery.
pub(crate) fn load_blueprints(
    explicit: Option<&Path>,
    config: &AppConfig,
) -> CliResult<InMemoryStore> {
    let dir = discover_blueprints_dir(explicit.or(config.blueprints.dir.as_deref()))
        .ok_or(CliError::BlueprintsNotFound)?;
    debug!(dir = %dir.display(), "loading blueprints");

    let store = FilesystemBlueprintLoader::new(dir).load_store()?;
    debug!(count = store.len(), "blueprints loaded");
    Ok(store)
}
