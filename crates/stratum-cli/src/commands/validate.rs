//! `stratum validate` — check a recipe against the available blueprints.

use std::sync::Arc;

use tracing::instrument;

use stratum_adapters::load_recipe;
use stratum_core::application::{BlueprintService, ModifierRegistry};

use crate::{
    cli::{OutputFormat, ValidateArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

/// Validate the recipe and every blueprint it references. Nothing executes.
#[instrument(skip_all, fields(recipe = %args.recipe.display()))]
pub fn execute(args: ValidateArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let recipe = load_recipe(&args.recipe)?;
    let store = super::load_blueprints(args.blueprints.as_deref(), &config)?;

    let service = BlueprintService::new(Arc::new(store));
    let warnings = service.check_recipe(&recipe, &ModifierRegistry::with_builtin())?;

    if output.format() == OutputFormat::Json {
        output.json(&serde_json::json!({
            "valid": true,
            "project": recipe.project.name,
            "modules": recipe.modules.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            "warnings": warnings,
        }))?;
        return Ok(());
    }

    for warning in &warnings {
        output.warning(warning)?;
    }
    output.success(&format!(
        "Recipe '{}' is valid ({} module(s))",
        recipe.project.name,
        recipe.modules.len()
    ))?;
    Ok(())
}
