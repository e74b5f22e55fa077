//! Module Orchestrator - runs a recipe end to end.
//!
//! 1. Validate the recipe
//! 2. Execute each module's blueprint, strictly in recipe order, against one VFS
//! 3. On the first failure, discard the VFS and stop
//! 4. On success, record the run and flush exactly once
//! 5. Install dependencies (best effort)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::application::interpreter::BlueprintInterpreter;
use crate::application::modifiers::ModifierRegistry;
use crate::application::ports::{
    BlueprintRegistry, CommandRunner, DependencyInstaller, Filesystem,
};
use crate::application::vfs::{VirtualFileSystem, WriteMode};
use crate::domain::{
    DomainValidator, ModuleReport, ModuleSpec, ModuleStatus, ProjectContext, Recipe,
    RelativePath, RunReport,
};

/// Record of a successful run, written at the project root.
pub const RUN_RECORD_FILE: &str = "stratum.json";

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Execute against the VFS and report, but never flush.
    pub dry_run: bool,
    /// Run the dependency installer after a successful flush.
    pub install: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            install: true,
        }
    }
}

pub struct Orchestrator {
    blueprints: Arc<dyn BlueprintRegistry>,
    storage: Arc<dyn Filesystem>,
    interpreter: BlueprintInterpreter,
    installer: Option<Arc<dyn DependencyInstaller>>,
}

impl Orchestrator {
    /// Create an orchestrator with the built-in modifiers.
    pub fn new(
        blueprints: Arc<dyn BlueprintRegistry>,
        storage: Arc<dyn Filesystem>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self::with_modifiers(blueprints, storage, runner, ModifierRegistry::with_builtin())
    }

    pub fn with_modifiers(
        blueprints: Arc<dyn BlueprintRegistry>,
        storage: Arc<dyn Filesystem>,
        runner: Arc<dyn CommandRunner>,
        modifiers: ModifierRegistry,
    ) -> Self {
        Self {
            blueprints,
            storage,
            interpreter: BlueprintInterpreter::new(Arc::new(modifiers), runner),
            installer: None,
        }
    }

    pub fn with_installer(mut self, installer: Arc<dyn DependencyInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    /// Execute a recipe into `root`.
    ///
    /// Never returns an error: every failure is folded into the report.
    #[instrument(skip_all, fields(project = %recipe.project.name, root = %root.as_ref().display()))]
    pub fn run(&self, recipe: &Recipe, root: impl AsRef<Path>, options: RunOptions) -> RunReport {
        let root = root.as_ref();
        let mut report = RunReport {
            run_id: Uuid::new_v4().to_string(),
            success: false,
            dry_run: options.dry_run,
            modules_executed: 0,
            modules: recipe
                .modules
                .iter()
                .map(|m| ModuleReport::pending(&m.id, &m.category))
                .collect(),
            errors: Vec::new(),
            warnings: Vec::new(),
            files_written: Vec::new(),
        };

        if let Err(e) = DomainValidator::validate_recipe(recipe) {
            error!(error = %e, "recipe rejected");
            report.errors.push(e.to_string());
            return report;
        }

        info!(modules = recipe.modules.len(), "Starting run");
        let base = ProjectContext::new(recipe, root);
        let mut vfs = VirtualFileSystem::new(root, Arc::clone(&self.storage));

        for (idx, module) in recipe.modules.iter().enumerate() {
            let ctx = base.for_module(module);
            let succeeded = self.run_module(module, &ctx, &mut vfs, &mut report.modules[idx]);

            let entry = &report.modules[idx];
            report.warnings.extend(
                entry
                    .warnings
                    .iter()
                    .map(|w| format!("[{}] {}", module.id, w)),
            );

            if !succeeded {
                report.errors.extend(
                    entry
                        .errors
                        .iter()
                        .map(|e| format!("[{}] {}", module.id, e)),
                );
                warn!(
                    module = %module.id,
                    discarded = vfs.log().len(),
                    "module failed, discarding pending changes"
                );
                return report;
            }
            report.modules_executed += 1;
        }

        if let Err(e) = write_run_record(&mut vfs, recipe, &report.run_id) {
            report.errors.push(e);
            return report;
        }

        if options.dry_run {
            report.files_written = vfs.all_files();
            report.success = true;
            info!(files = report.files_written.len(), "Dry run complete, nothing written");
            return report;
        }

        match vfs.flush() {
            Ok(written) => report.files_written = written,
            Err(e) => {
                error!(error = %e, "flush failed");
                report.errors.push(format!("Failed to write project: {e}"));
                return report;
            }
        }
        report.success = true;

        if options.install {
            if let Some(installer) = &self.installer {
                if let Err(e) = installer.install(root) {
                    warn!(error = %e, "dependency installation failed");
                    report.warnings.push(format!("Dependency installation failed: {e}"));
                }
            }
        }

        info!(
            modules = report.modules_executed,
            files = report.files_written.len(),
            "Run completed successfully"
        );
        report
    }

    /// Where a recipe's project lands when generated from `fallback`.
    pub fn project_root(recipe: &Recipe, fallback: &Path) -> PathBuf {
        match &recipe.project.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => fallback.join(root),
            None => fallback.join(&recipe.project.name),
        }
    }

    #[instrument(skip_all, fields(module = %module.id))]
    fn run_module(
        &self,
        module: &ModuleSpec,
        ctx: &ProjectContext,
        vfs: &mut VirtualFileSystem,
        entry: &mut ModuleReport,
    ) -> bool {
        if let Err(e) = entry.advance(ModuleStatus::Running) {
            entry.errors.push(e.to_string());
            return false;
        }

        let outcome = self
            .blueprints
            .get(&module.id)
            .map(|blueprint| self.interpreter.run_blueprint(&blueprint, ctx, vfs));

        let succeeded = match outcome {
            Ok(result) => {
                let ok = result.success();
                entry.files = result.files;
                entry.errors = result.errors;
                entry.warnings = result.warnings;
                ok
            }
            Err(e) => {
                entry.errors.push(e.to_string());
                false
            }
        };

        let next = if succeeded {
            ModuleStatus::Succeeded
        } else {
            ModuleStatus::Failed
        };
        if let Err(e) = entry.advance(next) {
            entry.errors.push(e.to_string());
            return false;
        }

        info!(status = %entry.status, files = entry.files.len(), "module finished");
        succeeded
    }
}

fn write_run_record(
    vfs: &mut VirtualFileSystem,
    recipe: &Recipe,
    run_id: &str,
) -> Result<(), String> {
    let record = json!({
        "project": {
            "name": recipe.project.name,
            "framework": recipe.project.framework,
            "description": recipe.project.description,
        },
        "modules": recipe
            .modules
            .iter()
            .map(|m| json!({"id": m.id, "category": m.category, "version": m.version}))
            .collect::<Vec<_>>(),
        "runId": run_id,
        "generatedAt": chrono::Utc::now().to_rfc3339(),
    });

    let path = RelativePath::try_new(RUN_RECORD_FILE).map_err(|e| e.to_string())?;
    let mut content = serde_json::to_string_pretty(&record).map_err(|e| e.to_string())?;
    content.push('\n');
    vfs.write(&path, &content, WriteMode::Overwrite)
        .map(|_| ())
        .map_err(|e| format!("Failed to record run: {e}"))
}
