//! Blueprint Interpreter: translates declarative actions into engine calls.
//!
//! Nothing escapes this boundary as an error. Each action yields a
//! [`ModuleResult`]; a blueprint run stops at the first action that records
//! an error and reports everything collected so far.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::application::ApplicationError;
use crate::application::engine::FileEngine;
use crate::application::modifiers::ModifierRegistry;
use crate::application::ports::{CommandInvocation, CommandRunner};
use crate::application::vfs::VirtualFileSystem;
use crate::domain::manifest::{self, PackageSpec};
use crate::domain::{
    Action, ArrayPolicy, Blueprint, EnvEntry, FallbackPolicy, ImportSpec, ModuleResult,
    ProjectContext, RelativePath,
};

/// Template env file; always written by `ADD_ENV_VAR`.
pub const ENV_EXAMPLE_FILE: &str = ".env.example";

/// Live env file; only updated when it already exists.
pub const ENV_FILE: &str = ".env";

type Step = Result<(), String>;

pub struct BlueprintInterpreter {
    modifiers: Arc<ModifierRegistry>,
    runner: Arc<dyn CommandRunner>,
}

impl BlueprintInterpreter {
    pub fn new(modifiers: Arc<ModifierRegistry>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { modifiers, runner }
    }

    /// Run every action of a blueprint in order, stopping at the first error.
    #[instrument(skip_all, fields(blueprint = %blueprint.id, actions = blueprint.actions.len()))]
    pub fn run_blueprint(
        &self,
        blueprint: &Blueprint,
        ctx: &ProjectContext,
        vfs: &mut VirtualFileSystem,
    ) -> ModuleResult {
        let mut result = ModuleResult::default();

        for (idx, action) in blueprint.actions.iter().enumerate() {
            let outcome = self.execute(action, ctx, vfs);
            let failed = !outcome.success();
            result.extend(outcome);

            if failed {
                warn!(
                    action = action.kind(),
                    index = idx + 1,
                    "action failed, skipping remaining actions"
                );
                break;
            }
        }

        result
    }

    /// Resolve placeholders in one action and execute it.
    #[instrument(skip_all, fields(action = action.kind(), module = ctx.module_id()))]
    pub fn execute(
        &self,
        action: &Action,
        ctx: &ProjectContext,
        vfs: &mut VirtualFileSystem,
    ) -> ModuleResult {
        let mut out = ModuleResult::default();
        let resolved = action.resolve(ctx);

        let step = resolved
            .validate()
            .map_err(|e| e.to_string())
            .and_then(|()| {
                let mut engine = FileEngine::new(vfs);
                self.dispatch(&resolved, ctx, &mut engine, &mut out)
            });

        match step {
            Ok(()) => debug!(files = out.files.len(), "action completed"),
            Err(message) => out.errors.push(format!("{} failed: {}", action.kind(), message)),
        }
        out
    }

    fn dispatch(
        &self,
        action: &Action,
        ctx: &ProjectContext,
        engine: &mut FileEngine<'_>,
        out: &mut ModuleResult,
    ) -> Step {
        match action {
            Action::CreateFile {
                path,
                content,
                overwrite,
            } => out.absorb(engine.create_file(path, content, *overwrite)),
            Action::OverwriteFile { path, content } => {
                out.absorb(engine.overwrite_file(path, content))
            }
            Action::AppendToFile { path, content } => {
                out.absorb(engine.append_to_file(path, content))
            }
            Action::PrependToFile { path, content } => {
                out.absorb(engine.prepend_to_file(path, content))
            }
            Action::ReplaceInFile {
                path,
                find,
                replace,
                all,
            } => self.replace_in_file(engine, out, path, find, replace, *all),
            Action::InstallPackages { packages, is_dev } => {
                let specs = packages
                    .iter()
                    .map(|p| PackageSpec::parse(p))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| e.to_string())?;
                let fragment = manifest::dependency_fragment(&specs, *is_dev);
                out.absorb(engine.merge_json_file(
                    ctx.manifest_path(),
                    &fragment,
                    ArrayPolicy::Replace,
                ))
            }
            Action::AddScript { name, command } => {
                let fragment = manifest::script_fragment(name, command);
                out.absorb(engine.merge_json_file(
                    ctx.manifest_path(),
                    &fragment,
                    ArrayPolicy::Replace,
                ))
            }
            Action::AddEnvVar {
                key,
                value,
                description,
            } => {
                let mut entry = EnvEntry::new(key.as_str(), value.as_str());
                entry.description = description.clone();
                self.add_env_var(engine, out, entry)
            }
            Action::MergeJson {
                path,
                content,
                concat_arrays,
            } => {
                let policy = if *concat_arrays {
                    ArrayPolicy::Concat
                } else {
                    ArrayPolicy::Replace
                };
                out.absorb(engine.merge_json_file(path, content, policy))
            }
            Action::MergeConfig {
                path,
                config,
                strategy,
            } => out.absorb(engine.merge_config_file(path, config, *strategy)),
            Action::EnhanceFile {
                path,
                modifier,
                params,
                fallback,
            } => self.enhance_file(engine, out, ctx, path, modifier, params, *fallback),
            Action::AddImports { path, imports } => {
                let imports = imports.clone();
                out.absorb(engine.modify_module_file(path, false, move |module| {
                    Ok(imports.into_iter().fold(module, |m, spec| m.add_import(spec)))
                }))
            }
            Action::AppendStatements { path, statements } => {
                out.absorb(engine.modify_module_file(path, true, |module| {
                    Ok(statements
                        .iter()
                        .fold(module, |m, statement| m.append_statement(statement)))
                }))
            }
            Action::WrapExport {
                path,
                wrapper,
                import,
            } => out.absorb(engine.modify_module_file(path, false, |module| {
                let module = match import {
                    Some(spec) => module.add_import(spec.clone()),
                    None => module,
                };
                module.wrap_default_export(wrapper)
            })),
            Action::ExtendSchema {
                path,
                tables,
                table_function,
                import_from,
            } => out.absorb(engine.modify_module_file(path, true, |module| {
                let builders: BTreeSet<&str> = tables
                    .iter()
                    .flat_map(|t| t.columns.iter().map(|c| c.kind.as_str()))
                    .collect();
                let names = std::iter::once(table_function.as_str())
                    .chain(builders.into_iter().filter(|b| *b != table_function.as_str()));
                let mut module = module.add_import(ImportSpec::named(import_from.as_str(), names));

                for table in tables {
                    if module.render().contains(&table.declaration_marker()) {
                        debug!(table = %table.name, "table already declared");
                        continue;
                    }
                    module = module.append_statement(&table.render(table_function));
                }
                Ok(module)
            })),
            Action::RunCommand { command, args, cwd } => {
                self.run_command(engine.vfs(), command, args, cwd.as_deref())
            }
        }
    }

    fn replace_in_file(
        &self,
        engine: &mut FileEngine<'_>,
        out: &mut ModuleResult,
        path: &str,
        find: &str,
        replace: &str,
        all: bool,
    ) -> Step {
        let current = engine.read(path).map_err(|e| e.to_string())?;
        let Some(current) = current else {
            out.warnings
                .push(format!("REPLACE_IN_FILE: '{path}' does not exist, nothing replaced"));
            return Ok(());
        };
        if !current.contains(find) {
            out.warnings
                .push(format!("REPLACE_IN_FILE: '{find}' not found in '{path}'"));
            return Ok(());
        }

        out.absorb(engine.modify_text_file(path, |text| {
            Ok(if all {
                text.replace(find, replace)
            } else {
                text.replacen(find, replace, 1)
            })
        }))
    }

    fn add_env_var(
        &self,
        engine: &mut FileEngine<'_>,
        out: &mut ModuleResult,
        entry: EnvEntry,
    ) -> Step {
        let entries = [entry];
        out.absorb(engine.merge_env_file(ENV_EXAMPLE_FILE, &entries))?;

        if engine.exists(ENV_FILE) {
            out.absorb(engine.merge_env_file(ENV_FILE, &entries))?;
        } else {
            debug!("no {} present, only {} updated", ENV_FILE, ENV_EXAMPLE_FILE);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn enhance_file(
        &self,
        engine: &mut FileEngine<'_>,
        out: &mut ModuleResult,
        ctx: &ProjectContext,
        path: &str,
        modifier: &str,
        params: &Value,
        fallback: FallbackPolicy,
    ) -> Step {
        let handler = self.modifiers.get(modifier);
        let target_exists = engine.exists(path);

        let problem = match (&handler, target_exists) {
            (None, _) => Some(ApplicationError::ModifierNotFound {
                name: modifier.to_string(),
            }),
            (Some(_), false) => Some(ApplicationError::TargetMissing {
                path: path.to_string(),
            }),
            (Some(_), true) => None,
        };

        if let Some(problem) = problem {
            match fallback {
                FallbackPolicy::Error => return Err(problem.to_string()),
                FallbackPolicy::Skip => {
                    warn!(%problem, "enhancement skipped");
                    out.warnings.push(format!("ENHANCE_FILE skipped: {problem}"));
                    return Ok(());
                }
                FallbackPolicy::Create => {
                    let stub = params
                        .get("fallbackContent")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    out.absorb(engine.create_file(path, stub, false))?;
                    out.warnings
                        .push(format!("ENHANCE_FILE: {problem}; created '{path}' instead"));
                    if handler.is_none() {
                        return Ok(());
                    }
                }
            }
        }

        match handler {
            Some(handler) => {
                debug!(modifier, path, "applying modifier");
                out.absorb(handler.apply(engine, path, params, ctx))
            }
            None => Ok(()),
        }
    }

    fn run_command(
        &self,
        vfs: &VirtualFileSystem,
        command: &str,
        args: &[String],
        cwd: Option<&str>,
    ) -> Step {
        let mut invocation = CommandInvocation::new(command).args(args.iter().cloned());
        match cwd {
            Some(dir) => {
                let dir = RelativePath::try_new(dir).map_err(|e| e.to_string())?;
                invocation = invocation.current_dir(dir.under(vfs.root()));
            }
            None if vfs.root_exists() => invocation = invocation.current_dir(vfs.root()),
            None => {}
        }

        info!(command = %invocation.display(), "running external command");
        let output = self.runner.run(&invocation).map_err(|e| e.to_string())?;

        if output.success() {
            debug!(stdout = %output.stdout.trim(), "command finished");
            Ok(())
        } else {
            Err(ApplicationError::CommandFailed {
                command: invocation.display(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }
            .to_string())
        }
    }
}
