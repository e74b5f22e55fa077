//! Structured merges: JSON-like documents, config files and env files.
//!
//! Pure functions over in-memory content. Callers read the current content
//! through the VFS, merge here and write the result back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use toml_edit::{DocumentMut, InlineTable, Item, Table};

use crate::domain::error::DomainError;

/// How arrays present on both sides of a merge are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayPolicy {
    /// The incoming array replaces the existing one.
    #[default]
    Replace,
    /// Incoming items are appended, skipping items already present.
    Concat,
}

/// Strategy for `MERGE_CONFIG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Recursive object merge.
    #[default]
    Deep,
    /// Only top-level keys are replaced.
    Shallow,
    /// The incoming document replaces the file.
    Replace,
}

/// Deep-merge `incoming` into `base`.
///
/// Object keys merge recursively, arrays follow `policy`, scalars (and any
/// type mismatch) are replaced by the incoming value.
pub fn deep_merge(base: &mut Value, incoming: &Value, policy: ArrayPolicy) {
    match (base, incoming) {
        (Value::Object(existing), Value::Object(patch)) => {
            for (key, value) in patch {
                match existing.get_mut(key) {
                    Some(slot) => deep_merge(slot, value, policy),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(patch)) if policy == ArrayPolicy::Concat => {
            for item in patch {
                if !existing.contains(item) {
                    existing.push(item.clone());
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// Apply a [`MergeStrategy`] and return the merged document.
pub fn merge_with_strategy(base: Value, incoming: &Value, strategy: MergeStrategy) -> Value {
    match strategy {
        MergeStrategy::Replace => incoming.clone(),
        MergeStrategy::Shallow => match (base, incoming) {
            (Value::Object(mut existing), Value::Object(patch)) => {
                for (k, v) in patch {
                    existing.insert(k.clone(), v.clone());
                }
                Value::Object(existing)
            }
            (_, value) => value.clone(),
        },
        MergeStrategy::Deep => {
            let mut merged = base;
            deep_merge(&mut merged, incoming, ArrayPolicy::Replace);
            merged
        }
    }
}

// ============================================================================
// Document formats
// ============================================================================

/// Serialisation format of a structured config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    pub fn from_extension(ext: Option<&str>) -> Option<Self> {
        match ext? {
            "json" | "jsonc" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }

    /// Parse a document; empty or whitespace-only content is an empty object.
    pub fn parse(self, path: &str, content: &str) -> Result<Value, DomainError> {
        if content.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        let invalid = |reason: String| DomainError::InvalidDocument {
            path: path.to_string(),
            format: self.name(),
            reason,
        };

        match self {
            Self::Json => serde_json::from_str(content).map_err(|e| invalid(e.to_string())),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| invalid(e.to_string())),
            Self::Toml => toml::from_str(content).map_err(|e| invalid(e.to_string())),
        }
    }

    /// Serialise a document with a trailing newline.
    pub fn render(self, path: &str, value: &Value) -> Result<String, DomainError> {
        let invalid = |reason: String| DomainError::InvalidDocument {
            path: path.to_string(),
            format: self.name(),
            reason,
        };

        let mut out = match self {
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| invalid(e.to_string()))?,
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| invalid(e.to_string()))?,
            Self::Toml => toml::to_string_pretty(value).map_err(|e| invalid(e.to_string()))?,
        };
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }
}

// ============================================================================
// TOML documents
// ============================================================================

/// Merge into TOML text, keeping comments, key order and formatting of
/// everything the merge does not replace.
///
/// Arrays are replaced, as with [`merge_with_strategy`]. A replaced scalar
/// keeps its trailing comment.
pub fn merge_toml(
    path: &str,
    content: &str,
    incoming: &Value,
    strategy: MergeStrategy,
) -> Result<String, DomainError> {
    let patch = match incoming {
        Value::Object(patch) if strategy != MergeStrategy::Replace => patch,
        _ => return DocumentFormat::Toml.render(path, incoming),
    };

    let mut document = content
        .parse::<DocumentMut>()
        .map_err(|e| DomainError::InvalidDocument {
            path: path.to_string(),
            format: DocumentFormat::Toml.name(),
            reason: e.to_string(),
        })?;

    let root = document.as_table_mut();
    for (key, value) in patch {
        match root.get_mut(key) {
            Some(slot) if strategy == MergeStrategy::Deep => merge_toml_item(slot, value),
            Some(slot) => replace_toml_item(slot, value),
            None => {
                if let Some(item) = toml_item(value, false) {
                    root.insert(key, item);
                }
            }
        }
    }

    let mut out = document.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

fn merge_toml_item(item: &mut Item, incoming: &Value) {
    if let Value::Object(patch) = incoming {
        let inline = item.is_inline_table();
        if let Some(table) = item.as_table_like_mut() {
            for (key, value) in patch {
                match table.get_mut(key) {
                    Some(slot) => merge_toml_item(slot, value),
                    None => {
                        if let Some(new) = toml_item(value, inline) {
                            table.insert(key, new);
                        }
                    }
                }
            }
            return;
        }
    }
    replace_toml_item(item, incoming);
}

fn replace_toml_item(item: &mut Item, incoming: &Value) {
    let Some(mut replacement) = toml_item(incoming, item.is_value()) else {
        *item = Item::None;
        return;
    };
    if let (Some(old), Some(new)) = (item.as_value(), replacement.as_value_mut()) {
        *new.decor_mut() = old.decor().clone();
    }
    *item = replacement;
}

/// Objects become `[table]` sections unless they must be inline. Nulls have
/// no TOML form and are dropped.
fn toml_item(value: &Value, inline: bool) -> Option<Item> {
    match value {
        Value::Object(map) if !inline => {
            let mut table = Table::new();
            for (key, value) in map {
                if let Some(item) = toml_item(value, false) {
                    table.insert(key, item);
                }
            }
            Some(Item::Table(table))
        }
        other => toml_value(other).map(Item::Value),
    }
}

fn toml_value(value: &Value) -> Option<toml_edit::Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some((*b).into()),
        Value::Number(n) => n
            .as_i64()
            .map(toml_edit::Value::from)
            .or_else(|| n.as_f64().map(toml_edit::Value::from)),
        Value::String(s) => Some(s.as_str().into()),
        Value::Array(items) => Some(toml_edit::Value::Array(
            items.iter().filter_map(toml_value).collect(),
        )),
        Value::Object(map) => {
            let mut table = InlineTable::new();
            for (key, value) in map {
                if let Some(value) = toml_value(value) {
                    table.insert(key, value);
                }
            }
            Some(table.into())
        }
    }
}

// ============================================================================
// Env files
// ============================================================================

/// One variable to merge into an env file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EnvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Merge variables into env-file content.
///
/// An existing `KEY=` line (optionally prefixed with `export `) is replaced in
/// place; unknown keys are appended, preceded by their description as a
/// comment. Comments, blank lines and unrelated keys are preserved.
pub fn merge_env(content: &str, entries: &[EnvEntry]) -> String {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    for entry in entries {
        let rendered = format!("{}={}", entry.key, quote_env_value(&entry.value));
        let position = lines.iter().position(|line| env_key(line) == Some(entry.key.as_str()));

        match position {
            Some(idx) => {
                let prefix = if lines[idx].trim_start().starts_with("export ") {
                    "export "
                } else {
                    ""
                };
                lines[idx] = format!("{prefix}{rendered}");
            }
            None => {
                if let Some(description) = &entry.description {
                    lines.push(format!("# {description}"));
                }
                lines.push(rendered);
            }
        }
    }

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn env_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, _) = trimmed.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

fn quote_env_value(value: &str) -> String {
    let needs_quotes = value.chars().any(|c| c.is_whitespace() || c == '#')
        && !(value.starts_with('"') && value.ends_with('"'));
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_merge_recursively_and_scalars_replace() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": "old"});
        deep_merge(&mut base, &json!({"a": {"y": 3, "z": 4}, "b": "new"}), ArrayPolicy::Replace);
        assert_eq!(base, json!({"a": {"x": 1, "y": 3, "z": 4}, "b": "new"}));
    }

    #[test]
    fn arrays_replace_by_default_and_concat_on_request() {
        let mut replaced = json!({"files": ["a", "b"]});
        deep_merge(&mut replaced, &json!({"files": ["c"]}), ArrayPolicy::Replace);
        assert_eq!(replaced, json!({"files": ["c"]}));

        let mut concatenated = json!({"files": ["a", "b"]});
        deep_merge(&mut concatenated, &json!({"files": ["b", "c"]}), ArrayPolicy::Concat);
        assert_eq!(concatenated, json!({"files": ["a", "b", "c"]}));
    }

    #[test]
    fn sequential_merges_equal_merged_fragments() {
        let doc = json!({
            "dependencies": {"core-lib": "1.0.0"},
            "name": "app",
            "files": ["dist"]
        });
        let a = json!({
            "dependencies": {"db-driver": "2.0.0"},
            "scripts": {"dev": "next"},
            "files": ["drizzle", "dist"]
        });
        let b = json!({
            "dependencies": {"auth": "5.0.0"},
            "scripts": {"build": "next build"},
            "files": ["public", "drizzle"]
        });

        for policy in [ArrayPolicy::Replace, ArrayPolicy::Concat] {
            let mut sequential = doc.clone();
            deep_merge(&mut sequential, &a, policy);
            deep_merge(&mut sequential, &b, policy);

            let mut fragment = a.clone();
            deep_merge(&mut fragment, &b, policy);
            let mut combined = doc.clone();
            deep_merge(&mut combined, &fragment, policy);

            assert_eq!(sequential, combined, "{policy:?}");
        }
    }

    #[test]
    fn concat_merge_keeps_first_occurrence_order() {
        let mut doc = json!({"files": ["dist"]});
        deep_merge(&mut doc, &json!({"files": ["drizzle", "dist"]}), ArrayPolicy::Concat);
        deep_merge(&mut doc, &json!({"files": ["public", "drizzle"]}), ArrayPolicy::Concat);
        assert_eq!(doc, json!({"files": ["dist", "drizzle", "public"]}));
    }

    #[test]
    fn deep_merge_keeps_existing_key_order() {
        let mut doc: Value = serde_json::from_str(
            r#"{"name": "app", "version": "1.0.0", "scripts": {}, "dependencies": {"core-lib": "1.0.0"}}"#,
        )
        .unwrap();
        deep_merge(
            &mut doc,
            &json!({"dependencies": {"db-driver": "2.0.0"}}),
            ArrayPolicy::Replace,
        );

        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["name", "version", "scripts", "dependencies"]);
        let deps: Vec<_> = doc["dependencies"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(deps, ["core-lib", "db-driver"]);
    }

    #[test]
    fn toml_merge_keeps_comments() {
        let content = "# deployment name\nname = \"app\"\n\n[vars]\nA = \"1\" # keep\n";
        let out = merge_toml(
            "wrangler.toml",
            content,
            &json!({"vars": {"B": "2"}}),
            MergeStrategy::Deep,
        )
        .unwrap();

        assert!(out.starts_with("# deployment name\nname = \"app\"\n"), "{out}");
        assert!(out.contains("A = \"1\" # keep"), "{out}");
        let parsed = DocumentFormat::Toml.parse("wrangler.toml", &out).unwrap();
        assert_eq!(parsed, json!({"name": "app", "vars": {"A": "1", "B": "2"}}));
    }

    #[test]
    fn toml_merge_replaces_scalar_but_keeps_its_comment() {
        let out = merge_toml(
            "c.toml",
            "[server]\nport = 8080 # public port\nhost = \"0.0.0.0\"\n",
            &json!({"server": {"port": 9090}}),
            MergeStrategy::Deep,
        )
        .unwrap();
        assert_eq!(out, "[server]\nport = 9090 # public port\nhost = \"0.0.0.0\"\n");
    }

    #[test]
    fn toml_merge_adds_sections_and_handles_inline_tables() {
        let out = merge_toml(
            "c.toml",
            "[db]\npool = { min = 1 }\n",
            &json!({"db": {"pool": {"max": 10}}, "cache": {"ttl": 60}}),
            MergeStrategy::Deep,
        )
        .unwrap();
        let parsed = DocumentFormat::Toml.parse("c.toml", &out).unwrap();
        assert_eq!(
            parsed,
            json!({"db": {"pool": {"min": 1, "max": 10}}, "cache": {"ttl": 60}})
        );
        assert!(out.contains("[cache]"), "{out}");
    }

    #[test]
    fn toml_shallow_merge_replaces_whole_sections() {
        let out = merge_toml(
            "c.toml",
            "# service\nname = \"api\"\n\n[a]\nx = 1\n\n[b]\ny = 2\n",
            &json!({"a": {"z": 3}}),
            MergeStrategy::Shallow,
        )
        .unwrap();
        assert!(out.starts_with("# service\nname = \"api\"\n"), "{out}");
        let parsed = DocumentFormat::Toml.parse("c.toml", &out).unwrap();
        assert_eq!(parsed, json!({"name": "api", "a": {"z": 3}, "b": {"y": 2}}));
    }

    #[test]
    fn toml_merge_rejects_broken_documents() {
        assert!(matches!(
            merge_toml("c.toml", "[unclosed", &json!({"a": 1}), MergeStrategy::Deep),
            Err(DomainError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn strategies() {
        let base = json!({"a": {"x": 1}, "b": 1});
        let patch = json!({"a": {"y": 2}});
        assert_eq!(
            merge_with_strategy(base.clone(), &patch, MergeStrategy::Deep),
            json!({"a": {"x": 1, "y": 2}, "b": 1})
        );
        assert_eq!(
            merge_with_strategy(base.clone(), &patch, MergeStrategy::Shallow),
            json!({"a": {"y": 2}, "b": 1})
        );
        assert_eq!(merge_with_strategy(base, &patch, MergeStrategy::Replace), patch);
    }

    #[test]
    fn formats_parse_and_render() {
        let yaml = DocumentFormat::Yaml
            .parse("c.yml", "services:\n  db:\n    image: postgres\n")
            .unwrap();
        assert_eq!(yaml, json!({"services": {"db": {"image": "postgres"}}}));

        let toml = DocumentFormat::Toml.parse("c.toml", "[server]\nport = 8080\n").unwrap();
        assert_eq!(toml, json!({"server": {"port": 8080}}));

        let rendered = DocumentFormat::Json.render("c.json", &json!({"a": 1})).unwrap();
        assert_eq!(rendered, "{\n  \"a\": 1\n}\n");

        assert_eq!(DocumentFormat::Json.parse("e.json", "  ").unwrap(), json!({}));
        assert!(matches!(
            DocumentFormat::Json.parse("bad.json", "{oops"),
            Err(DomainError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn env_merge_replaces_in_place_and_preserves_comments() {
        let content = "# database\nDATABASE_URL=old\nexport PORT=3000\n";
        let out = merge_env(
            content,
            &[
                EnvEntry::new("DATABASE_URL", "postgres://localhost/db"),
                EnvEntry::new("PORT", "4000"),
                EnvEntry::new("AUTH_SECRET", "changeme").with_description("Session signing key"),
            ],
        );
        assert_eq!(
            out,
            "# database\nDATABASE_URL=postgres://localhost/db\nexport PORT=4000\n# Session signing key\nAUTH_SECRET=changeme\n"
        );
    }

    #[test]
    fn env_values_with_spaces_are_quoted() {
        assert_eq!(
            merge_env("", &[EnvEntry::new("GREETING", "hello world")]),
            "GREETING=\"hello world\"\n"
        );
    }

    #[test]
    fn commented_keys_are_not_matched() {
        let out = merge_env("# API_KEY=\n", &[EnvEntry::new("API_KEY", "x")]);
        assert_eq!(out, "# API_KEY=\nAPI_KEY=x\n");
    }
}
