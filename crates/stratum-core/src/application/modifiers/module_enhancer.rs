use serde::Deserialize;
use serde_json::Value;

use super::{Modifier, parse_params};
use crate::application::engine::FileEngine;
use crate::domain::{ImportSpec, OperationResult, ProjectContext};

/// `module-enhancer`: adds imports, appends statements and optionally wraps
/// the default export, leaving every other line of the module untouched.
pub struct ModuleEnhancer;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Params {
    #[serde(default)]
    imports: Vec<ImportSpec>,
    #[serde(default)]
    statements: Vec<String>,
    #[serde(default)]
    wrap_export: Option<String>,
}

impl Modifier for ModuleEnhancer {
    fn name(&self) -> &str {
        "module-enhancer"
    }

    fn description(&self) -> &str {
        "Add imports and statements to a source module"
    }

    fn apply(
        &self,
        engine: &mut FileEngine<'_>,
        path: &str,
        params: &Value,
        _ctx: &ProjectContext,
    ) -> OperationResult {
        let params: Params = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(e) => return OperationResult::failed(path, e),
        };

        engine.modify_module_file(path, false, move |module| {
            let mut module = params
                .imports
                .into_iter()
                .fold(module, |m, spec| m.add_import(spec));
            for statement in &params.statements {
                module = module.append_statement(statement);
            }
            match params.wrap_export {
                Some(wrapper) => module.wrap_default_export(&wrapper),
                None => Ok(module),
            }
        })
    }
}
