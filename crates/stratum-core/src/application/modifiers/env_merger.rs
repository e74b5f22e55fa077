use serde::Deserialize;
use serde_json::Value;

use super::{Modifier, parse_params};
use crate::application::engine::FileEngine;
use crate::domain::{EnvEntry, OperationResult, ProjectContext};

/// `env-merger`: line-level replace-or-append of `KEY=value` pairs.
pub struct EnvMerger;

#[derive(Deserialize)]
struct Params {
    variables: Vec<EnvEntry>,
}

impl Modifier for EnvMerger {
    fn name(&self) -> &str {
        "env-merger"
    }

    fn description(&self) -> &str {
        "Replace or append KEY=value lines, keeping comments"
    }

    fn apply(
        &self,
        engine: &mut FileEngine<'_>,
        path: &str,
        params: &Value,
        _ctx: &ProjectContext,
    ) -> OperationResult {
        match parse_params::<Params>(self.name(), params) {
            Ok(p) if p.variables.is_empty() => {
                OperationResult::failed(path, "env-merger expects at least one variable")
            }
            Ok(p) => engine.merge_env_file(path, &p.variables),
            Err(e) => OperationResult::failed(path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::application::testing::MemoryStorage;
    use crate::application::vfs::VirtualFileSystem;
    use crate::domain::{ProjectMeta, Recipe};

    #[test]
    fn replaces_existing_keys() {
        let storage = MemoryStorage::with_file("/p/.env.local", "# local\nPORT=3000\n");
        let mut vfs = VirtualFileSystem::new("/p", Arc::new(storage));
        let mut engine = FileEngine::new(&mut vfs);
        let ctx = ProjectContext::new(&Recipe::new(ProjectMeta::new("p")), "/p");

        let result = EnvMerger.apply(
            &mut engine,
            ".env.local",
            &json!({"variables": [
                {"key": "PORT", "value": "4000"},
                {"key": "DEBUG", "value": "true", "description": "Verbose logs"}
            ]}),
            &ctx,
        );
        assert!(result.success);
        assert_eq!(
            engine.read(".env.local").unwrap().as_deref(),
            Some("# local\nPORT=4000\n# Verbose logs\nDEBUG=true\n")
        );
    }
}
