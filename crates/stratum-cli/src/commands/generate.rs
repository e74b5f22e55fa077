//! Implementation of the `stratum generate` command.
//!
//! Loads the recipe and blueprints, wires the orchestrator to the local disk,
//! and renders the run report. No business logic lives here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument};

use stratum_adapters::{LocalFilesystem, PackageManagerInstaller, SystemCommandRunner, load_recipe};
use stratum_core::application::{Orchestrator, RunOptions, ports::CommandRunner};
use stratum_core::domain::{Recipe, RunReport};

use crate::{
    cli::{GenerateArgs, OutputFormat, global::GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Execute the `stratum generate` command.
///
/// 1. Load the recipe and the blueprint directory
/// 2. Resolve the project root
/// 3. Confirm generation into a non-empty directory
/// 4. Run the orchestrator (dry or real)
/// 5. Render the report; a failed run exits with code 5
#[instrument(skip_all, fields(recipe = %args.recipe.display()))]
pub fn execute(
    args: GenerateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let recipe = load_recipe(&args.recipe)?;
    let store = super::load_blueprints(args.blueprints.as_deref(), &config)?;

    let cwd = std::env::current_dir().with_cli_context(|| "cannot read the current directory")?;
    let root = resolve_root(&recipe, args.output.as_deref(), &cwd);

    if !args.dry_run && !args.yes {
        confirm_target(&root, &global)?;
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
    let install = config.install.enabled && !args.no_install;
    let mut orchestrator = Orchestrator::new(
        Arc::new(store),
        Arc::new(LocalFilesystem::new()),
        Arc::clone(&runner),
    );
    if install {
        orchestrator = orchestrator.with_installer(Arc::new(PackageManagerInstaller::new(
            config.install.package_manager,
            runner,
        )));
    }

    info!(project = %recipe.project.name, root = %root.display(), "Generation started");
    let spinner = output.spinner(format!("Generating '{}'...", recipe.project.name));
    let report = orchestrator.run(
        &recipe,
        &root,
        RunOptions {
            dry_run: args.dry_run,
            install,
        },
    );
    spinner.finish_and_clear();

    output.report(&report)?;

    if !report.success {
        return Err(run_failure(&report));
    }

    if output.format() != OutputFormat::Json && !args.dry_run {
        output.success(&format!(
            "Project '{}' generated at {}",
            recipe.project.name,
            root.display()
        ))?;
    }
    Ok(())
}

/// `--output` is the exact project root; otherwise the recipe decides.
fn resolve_root(recipe: &Recipe, output: Option<&Path>, cwd: &Path) -> PathBuf {
    match output {
        Some(dir) => dir.to_path_buf(),
        None => Orchestrator::project_root(recipe, cwd),
    }
}

fn run_failure(report: &RunReport) -> CliError {
    CliError::RunFailed {
        module: report
            .failed_module()
            .map(|m| m.id.clone())
            .unwrap_or_else(|| "recipe".into()),
        errors: report.errors.clone(),
    }
}

fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Ask before generating into a directory that already has files.
fn confirm_target(root: &Path, global: &GlobalArgs) -> CliResult<()> {
    if !is_non_empty_dir(root) {
        return Ok(());
    }

    #[cfg(feature = "interactive")]
    {
        use std::io::IsTerminal as _;

        if !global.quiet && std::io::stdin().is_terminal() && std::io::stderr().is_terminal() {
            let proceed = dialoguer::Confirm::new()
                .with_prompt(format!(
                    "'{}' is not empty. Generate into it anyway?",
                    root.display()
                ))
                .default(false)
                .interact()
                .map_err(|e| CliError::InvalidInput {
                    message: "failed to read confirmation input".into(),
                    source: Some(Box::new(e)),
                })?;
            return if proceed { Ok(()) } else { Err(CliError::Cancelled) };
        }
    }

    #[cfg(not(feature = "interactive"))]
    let _ = global;

    Err(CliError::DirectoryNotEmpty {
        path: root.to_path_buf(),
    })
}
