//! Project context and template processing.
//!
//! A [`ProjectContext`] is built once per run by the orchestrator and then
//! specialised (cheaply cloned) for each module. Interpreters only read it.
//!
//! ## Placeholders
//!
//! | Placeholder | Example | Source |
//! |-------------|---------|--------|
//! | `{{project.name}}` | "My Shop" | recipe |
//! | `{{project.root}}` | "/work/my-shop" | orchestrator |
//! | `{{module.parameters.provider}}` | "postgres" | current module |
//! | `{{paths.lib}}` | "src/lib/" | framework path table |
//! | `{{modules.auth.version}}` | "5.0.0" | sibling module |
//! | `{{PROJECT_NAME_KEBAB}}` | "my-shop" | computed |
//!
//! Unknown placeholders are left verbatim.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde_json::{Map, Value, json};

use crate::domain::entities::recipe::{ModuleSpec, ProjectMeta, Recipe};

/// Read-only view of the run handed to interpreters and modifiers.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    project: ProjectMeta,
    root: PathBuf,
    module: Option<ModuleSpec>,
    paths: BTreeMap<String, String>,
    modules: BTreeMap<String, ModuleSpec>,

    /// Dotted-path lookup tree, rebuilt whenever the module changes.
    tree: Value,
    /// Flat `SCREAMING_SNAKE_CASE` variables.
    variables: HashMap<String, String>,
}

impl ProjectContext {
    /// Build the run-wide context from a recipe.
    pub fn new(recipe: &Recipe, root: impl Into<PathBuf>) -> Self {
        let project = recipe.project.clone();
        let name = project.name.clone();

        let mut variables = HashMap::new();
        variables.insert("PROJECT_NAME".to_string(), name.clone());
        variables.insert("PROJECT_NAME_SNAKE".to_string(), to_snake_case(&name));
        variables.insert("PROJECT_NAME_KEBAB".to_string(), to_kebab_case(&name));
        variables.insert("PROJECT_NAME_PASCAL".to_string(), to_pascal_case(&name));
        variables.insert(
            "YEAR".to_string(),
            chrono::Local::now().year().to_string(),
        );

        let mut ctx = Self {
            project,
            root: root.into(),
            module: None,
            paths: recipe.path_table(),
            modules: recipe
                .modules
                .iter()
                .map(|m| (m.id.clone(), m.clone()))
                .collect(),
            tree: Value::Null,
            variables,
        };
        ctx.tree = ctx.build_tree();
        ctx
    }

    /// Specialise the context for the module about to execute.
    pub fn for_module(&self, module: &ModuleSpec) -> Self {
        let mut ctx = self.clone();
        ctx.module = Some(module.clone());
        ctx.tree = ctx.build_tree();
        ctx
    }

    /// Add a flat variable, consuming self.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn project(&self) -> &ProjectMeta {
        &self.project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module(&self) -> Option<&ModuleSpec> {
        self.module.as_ref()
    }

    pub fn module_id(&self) -> &str {
        self.module.as_ref().map_or("<none>", |m| m.id.as_str())
    }

    pub fn manifest_path(&self) -> &str {
        self.project.manifest_path()
    }

    pub fn path(&self, key: &str) -> Option<&str> {
        self.paths.get(key).map(String::as_str)
    }

    /// Look up a sibling module scheduled in the same recipe.
    pub fn sibling(&self, id: &str) -> Option<&ModuleSpec> {
        self.modules.get(id)
    }

    /// Resolve a placeholder expression to its string form.
    pub fn get(&self, expr: &str) -> Option<String> {
        lookup(&self.tree, expr)
            .map(value_to_text)
            .or_else(|| self.variables.get(expr).cloned())
    }

    /// Substitute every `{{ expr }}` in `template`.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                break;
            };

            out.push_str(&rest[..start]);
            let expr = after[..end].trim();
            match self.get(expr) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        out
    }

    /// Render every string leaf (and object key) of a JSON payload.
    pub fn render_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.render(s)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.render_value(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (self.render(k), self.render_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn build_tree(&self) -> Value {
        let modules: Map<String, Value> = self
            .modules
            .iter()
            .map(|(id, m)| (id.clone(), module_tree(m)))
            .collect();

        json!({
            "project": {
                "name": self.project.name,
                "root": self.root.display().to_string(),
                "description": self.project.description,
                "framework": self.project.framework,
                "manifest": self.project.manifest_path(),
            },
            "module": self.module.as_ref().map_or(Value::Null, module_tree),
            "paths": self.paths,
            "modules": modules,
        })
    }
}

fn module_tree(module: &ModuleSpec) -> Value {
    json!({
        "id": module.id,
        "category": module.category,
        "version": module.version,
        "parameters": module.parameters,
    })
}

fn lookup<'a>(tree: &'a Value, expr: &str) -> Option<&'a Value> {
    if expr.is_empty() {
        return None;
    }
    let mut current = tree;
    for segment in expr.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// String Case Conversion Helpers
// ============================================================================

fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::new();
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                    out
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Split on `_`, `-`, whitespace, camelCase transitions and acronym
/// boundaries (`HTTPServer` → `http`, `server`).
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(next) = chars.peek() {
            if c.is_lowercase() && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(|n| n.is_lowercase())
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::recipe::{ModuleSpec, ProjectMeta, Recipe};

    fn ctx() -> ProjectContext {
        let mut project = ProjectMeta::new("my awesome shop");
        project.framework = Some("nextjs".into());
        let recipe = Recipe::new(project)
            .with_module(
                ModuleSpec::new("nextjs", "framework")
                    .with_version("15.0.0")
                    .with_parameter("paths", json!({"lib": "src/lib/"})),
            )
            .with_module(
                ModuleSpec::new("drizzle", "database")
                    .with_parameter("provider", json!("postgres"))
                    .with_parameter("pool", json!({"max": 10})),
            );
        let base = ProjectContext::new(&recipe, "/work/shop");
        let module = recipe.modules[1].clone();
        base.for_module(&module)
    }

    #[test]
    fn standard_variables() {
        let ctx = ctx();
        assert_eq!(ctx.get("PROJECT_NAME").as_deref(), Some("my awesome shop"));
        assert_eq!(ctx.get("PROJECT_NAME_SNAKE").as_deref(), Some("my_awesome_shop"));
        assert_eq!(ctx.get("PROJECT_NAME_KEBAB").as_deref(), Some("my-awesome-shop"));
        assert_eq!(ctx.get("PROJECT_NAME_PASCAL").as_deref(), Some("MyAwesomeShop"));
    }

    #[test]
    fn dotted_lookups() {
        let ctx = ctx();
        assert_eq!(ctx.get("project.framework").as_deref(), Some("nextjs"));
        assert_eq!(ctx.get("module.id").as_deref(), Some("drizzle"));
        assert_eq!(ctx.get("module.parameters.provider").as_deref(), Some("postgres"));
        assert_eq!(ctx.get("module.parameters.pool.max").as_deref(), Some("10"));
        assert_eq!(ctx.get("paths.lib").as_deref(), Some("src/lib/"));
        assert_eq!(ctx.get("modules.nextjs.version").as_deref(), Some("15.0.0"));
        assert_eq!(ctx.get("project.manifest").as_deref(), Some("package.json"));
    }

    #[test]
    fn render_replaces_known_and_keeps_unknown() {
        let ctx = ctx();
        let out = ctx.render("{{paths.lib}}db.ts uses {{ module.parameters.provider }} {{nope}}");
        assert_eq!(out, "src/lib/db.ts uses postgres {{nope}}");
    }

    #[test]
    fn render_handles_unterminated_placeholder() {
        let ctx = ctx();
        assert_eq!(ctx.render("a {{module.id"), "a {{module.id");
        assert_eq!(ctx.render("{{module.id}}{{module.id}}"), "drizzledrizzle");
    }

    #[test]
    fn render_value_walks_nested_payloads() {
        let ctx = ctx();
        let rendered = ctx.render_value(&json!({
            "dependencies": { "{{module.id}}": "{{modules.nextjs.version}}" },
            "list": ["{{paths.lib}}", 3]
        }));
        assert_eq!(
            rendered,
            json!({
                "dependencies": { "drizzle": "15.0.0" },
                "list": ["src/lib/", 3]
            })
        );
    }

    #[test]
    fn objects_render_as_compact_json() {
        let ctx = ctx();
        assert_eq!(ctx.get("module.parameters.pool").as_deref(), Some(r#"{"max":10}"#));
    }

    #[test]
    fn split_words_handles_acronyms() {
        assert_eq!(split_words("HTTPServer"), vec!["http", "server"]);
        assert_eq!(split_words("myApp-v2"), vec!["my", "app", "v2"]);
    }
}
