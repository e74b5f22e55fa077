use serde::Deserialize;
use serde_json::Value;

use super::{Modifier, parse_params};
use crate::application::engine::FileEngine;
use crate::domain::{ArrayPolicy, OperationResult, ProjectContext};

/// `json-merger`: deep-merges `params.content` into a JSON document.
pub struct JsonMerger;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    content: Value,
    #[serde(default)]
    concat_arrays: bool,
}

impl Modifier for JsonMerger {
    fn name(&self) -> &str {
        "json-merger"
    }

    fn description(&self) -> &str {
        "Deep-merge an object into a JSON document"
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
        if !params.content.is_object() {
            return OperationResult::failed(path, "json-merger expects `content` to be an object");
        }

        let policy = if params.concat_arrays {
            ArrayPolicy::Concat
        } else {
            ArrayPolicy::Replace
        };
        engine.merge_json_file(path, &params.content, policy)
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
    fn merges_with_array_concatenation() {
        let storage = MemoryStorage::with_file("/p/tsconfig.json", r#"{"include":["src"]}"#);
        let mut vfs = VirtualFileSystem::new("/p", Arc::new(storage));
        let mut engine = FileEngine::new(&mut vfs);
        let ctx = ProjectContext::new(&Recipe::new(ProjectMeta::new("p")), "/p");

        let result = JsonMerger.apply(
            &mut engine,
            "tsconfig.json",
            &json!({"content": {"include": ["types"]}, "concatArrays": true}),
            &ctx,
        );
        assert!(result.success);

        let doc: Value =
            serde_json::from_str(&engine.read("tsconfig.json").unwrap().unwrap()).unwrap();
        assert_eq!(doc, json!({"include": ["src", "types"]}));
    }

    #[test]
    fn missing_content_fails() {
        let mut vfs = VirtualFileSystem::new("/p", Arc::new(MemoryStorage::default()));
        let mut engine = FileEngine::new(&mut vfs);
        let ctx = ProjectContext::new(&Recipe::new(ProjectMeta::new("p")), "/p");

        assert!(!JsonMerger.apply(&mut engine, "a.json", &json!({}), &ctx).success);
    }
}
