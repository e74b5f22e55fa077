use serde::Deserialize;
use serde_json::Value;

use super::{Modifier, parse_params};
use crate::application::engine::FileEngine;
use crate::domain::{MergeStrategy, OperationResult, ProjectContext};

/// `config-merger`: merges a config object into a JSON, YAML or TOML file.
pub struct ConfigMerger;

#[derive(Deserialize)]
struct Params {
    config: Value,
    #[serde(default)]
    strategy: MergeStrategy,
}

impl Modifier for ConfigMerger {
    fn name(&self) -> &str {
        "config-merger"
    }

    fn description(&self) -> &str {
        "Merge a config object into a JSON, YAML or TOML file"
    }

    fn apply(
        &self,
        engine: &mut FileEngine<'_>,
        path: &str,
        params: &Value,
        _ctx: &ProjectContext,
    ) -> OperationResult {
        match parse_params::<Params>(self.name(), params) {
            Ok(p) if p.config.is_object() => engine.merge_config_file(path, &p.config, p.strategy),
            Ok(_) => {
                OperationResult::failed(path, "config-merger expects `config` to be an object")
            }
            Err(e) => OperationResult::failed(path, e),
        }
    }
}
