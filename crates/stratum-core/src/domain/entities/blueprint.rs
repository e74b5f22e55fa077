//! Blueprints and the closed set of actions they are made of.
//!
//! A blueprint is authored as data (JSON, YAML or TOML) and decoded into the
//! [`Action`] sum type. Decoding checks the `type` discriminant first so an
//! unrecognised action is reported as such rather than as a generic parse
//! failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entities::common::RelativePath;
use crate::domain::entities::context::ProjectContext;
use crate::domain::error::DomainError;
use crate::domain::manifest::PackageSpec;
use crate::domain::merge::MergeStrategy;
use crate::domain::source_module::ImportSpec;

/// A module's ordered list of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlueprint", rename_all = "camelCase")]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    pub actions: Vec<Action>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlueprint {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    actions: Vec<Value>,
}

impl TryFrom<RawBlueprint> for Blueprint {
    type Error = DomainError;

    fn try_from(raw: RawBlueprint) -> Result<Self, Self::Error> {
        let actions = raw
            .actions
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                Action::from_value(value).map_err(|e| DomainError::InvalidBlueprint {
                    blueprint: raw.id.clone(),
                    reason: format!("action #{}: {}", idx + 1, e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let blueprint = Self {
            name: raw.name.unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            description: raw.description,
            version: raw.version.unwrap_or_else(|| "latest".to_string()),
            actions,
        };
        blueprint.validate()?;
        Ok(blueprint)
    }
}

impl Blueprint {
    pub fn new(id: impl Into<String>, actions: Vec<Action>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            version: "latest".to_string(),
            actions,
        }
    }

    /// Decode a blueprint document, reporting domain errors.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        let raw: RawBlueprint =
            serde_json::from_value(value).map_err(|e| DomainError::InvalidBlueprint {
                blueprint: "<unknown>".into(),
                reason: e.to_string(),
            })?;
        Self::try_from(raw)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::InvalidBlueprint {
                blueprint: self.id.clone(),
                reason: "blueprint id cannot be empty".into(),
            });
        }

        for (idx, action) in self.actions.iter().enumerate() {
            action.validate().map_err(|e| DomainError::InvalidBlueprint {
                blueprint: self.id.clone(),
                reason: format!("action #{}: {}", idx + 1, e),
            })?;
        }

        Ok(())
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Behaviour of `ENHANCE_FILE` when the modifier or its target is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Record a warning and continue.
    Skip,
    /// Materialise a stub file.
    Create,
    /// Fail the action.
    #[default]
    Error,
}

/// A column of an [`SchemaTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumn {
    pub name: String,
    /// Column builder, e.g. `text`, `serial`, `timestamp`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    /// Database column name; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
}

/// A table declaration added by `EXTEND_SCHEMA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub columns: Vec<SchemaColumn>,
}

impl SchemaTable {
    /// Prefix identifying an existing declaration of this table.
    pub fn declaration_marker(&self) -> String {
        format!("export const {} =", self.name)
    }

    pub fn render(&self, table_function: &str) -> String {
        let table_name = self.table_name.as_deref().unwrap_or(&self.name);
        let mut out = format!(
            "{} {table_function}(\"{table_name}\", {{\n",
            self.declaration_marker()
        );
        for column in &self.columns {
            let column_name = column.column_name.as_deref().unwrap_or(&column.name);
            out.push_str(&format!("  {}: {}(\"{column_name}\")", column.name, column.kind));
            for modifier in &column.modifiers {
                if modifier.contains('(') {
                    out.push_str(&format!(".{modifier}"));
                } else {
                    out.push_str(&format!(".{modifier}()"));
                }
            }
            out.push_str(",\n");
        }
        out.push_str("});");
        out
    }
}

fn default_table_function() -> String {
    "pgTable".to_string()
}

fn default_schema_import() -> String {
    "drizzle-orm/pg-core".to_string()
}

/// One declarative step of a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    CreateFile {
        path: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        overwrite: bool,
    },
    OverwriteFile {
        path: String,
        content: String,
    },
    AppendToFile {
        path: String,
        content: String,
    },
    PrependToFile {
        path: String,
        content: String,
    },
    ReplaceInFile {
        path: String,
        find: String,
        replace: String,
        #[serde(default)]
        all: bool,
    },
    InstallPackages {
        packages: Vec<String>,
        #[serde(default)]
        is_dev: bool,
    },
    AddScript {
        name: String,
        command: String,
    },
    AddEnvVar {
        key: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    MergeJson {
        path: String,
        content: Value,
        #[serde(default)]
        concat_arrays: bool,
    },
    MergeConfig {
        path: String,
        config: Value,
        #[serde(default)]
        strategy: MergeStrategy,
    },
    EnhanceFile {
        path: String,
        modifier: String,
        #[serde(default)]
        params: Value,
        #[serde(default)]
        fallback: FallbackPolicy,
    },
    AddImports {
        path: String,
        imports: Vec<ImportSpec>,
    },
    AppendStatements {
        path: String,
        statements: Vec<String>,
    },
    WrapExport {
        path: String,
        wrapper: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        import: Option<ImportSpec>,
    },
    ExtendSchema {
        path: String,
        tables: Vec<SchemaTable>,
        #[serde(default = "default_table_function")]
        table_function: String,
        #[serde(default = "default_schema_import")]
        import_from: String,
    },
    RunCommand {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
    },
}

impl Action {
    /// Every discriminant accepted in blueprint documents.
    pub const KINDS: [&'static str; 16] = [
        "CREATE_FILE",
        "OVERWRITE_FILE",
        "APPEND_TO_FILE",
        "PREPEND_TO_FILE",
        "REPLACE_IN_FILE",
        "INSTALL_PACKAGES",
        "ADD_SCRIPT",
        "ADD_ENV_VAR",
        "MERGE_JSON",
        "MERGE_CONFIG",
        "ENHANCE_FILE",
        "ADD_IMPORTS",
        "APPEND_STATEMENTS",
        "WRAP_EXPORT",
        "EXTEND_SCHEMA",
        "RUN_COMMAND",
    ];

    /// Decode and validate one action document.
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::malformed("untyped", "missing `type` discriminant"))?;

        if !Self::KINDS.contains(&kind) {
            return Err(DomainError::UnknownAction {
                kind: kind.to_string(),
            });
        }

        let action: Self = serde_json::from_value(value.clone())
            .map_err(|e| DomainError::malformed(kind, e.to_string()))?;
        action.validate()?;
        Ok(action)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateFile { .. } => "CREATE_FILE",
            Self::OverwriteFile { .. } => "OVERWRITE_FILE",
            Self::AppendToFile { .. } => "APPEND_TO_FILE",
            Self::PrependToFile { .. } => "PREPEND_TO_FILE",
            Self::ReplaceInFile { .. } => "REPLACE_IN_FILE",
            Self::InstallPackages { .. } => "INSTALL_PACKAGES",
            Self::AddScript { .. } => "ADD_SCRIPT",
            Self::AddEnvVar { .. } => "ADD_ENV_VAR",
            Self::MergeJson { .. } => "MERGE_JSON",
            Self::MergeConfig { .. } => "MERGE_CONFIG",
            Self::EnhanceFile { .. } => "ENHANCE_FILE",
            Self::AddImports { .. } => "ADD_IMPORTS",
            Self::AppendStatements { .. } => "APPEND_STATEMENTS",
            Self::WrapExport { .. } => "WRAP_EXPORT",
            Self::ExtendSchema { .. } => "EXTEND_SCHEMA",
            Self::RunCommand { .. } => "RUN_COMMAND",
        }
    }

    /// The file the action targets, when it names one.
    pub fn target_path(&self) -> Option<&str> {
        match self {
            Self::CreateFile { path, .. }
            | Self::OverwriteFile { path, .. }
            | Self::AppendToFile { path, .. }
            | Self::PrependToFile { path, .. }
            | Self::ReplaceInFile { path, .. }
            | Self::MergeJson { path, .. }
            | Self::MergeConfig { path, .. }
            | Self::EnhanceFile { path, .. }
            | Self::AddImports { path, .. }
            | Self::AppendStatements { path, .. }
            | Self::WrapExport { path, .. }
            | Self::ExtendSchema { path, .. } => Some(path),
            Self::InstallPackages { .. }
            | Self::AddScript { .. }
            | Self::AddEnvVar { .. }
            | Self::RunCommand { .. } => None,
        }
    }

    /// Check that every required field is present and usable.
    pub fn validate(&self) -> Result<(), DomainError> {
        let kind = self.kind();
        let require = |value: &str, field: &str| -> Result<(), DomainError> {
            if value.trim().is_empty() {
                Err(DomainError::malformed(kind, format!("`{field}` cannot be empty")))
            } else {
                Ok(())
            }
        };

        if let Some(path) = self.target_path() {
            require(path, "path")?;
            // Templated paths are checked again once rendered.
            if !path.contains("{{") {
                RelativePath::try_new(path)?;
            }
        }

        match self {
            Self::ReplaceInFile { find, .. } => require(find, "find"),
            Self::InstallPackages { packages, .. } => {
                if packages.is_empty() {
                    return Err(DomainError::malformed(kind, "`packages` cannot be empty"));
                }
                for package in packages.iter().filter(|p| !p.contains("{{")) {
                    PackageSpec::parse(package)?;
                }
                Ok(())
            }
            Self::AddScript { name, command } => {
                require(name, "name")?;
                require(command, "command")
            }
            Self::AddEnvVar { key, .. } => {
                require(key, "key")?;
                if key.contains('=') || key.chars().any(char::is_whitespace) {
                    return Err(DomainError::malformed(
                        kind,
                        format!("`{key}` is not a valid variable name"),
                    ));
                }
                Ok(())
            }
            Self::MergeJson { content, .. } => {
                if content.is_object() {
                    Ok(())
                } else {
                    Err(DomainError::malformed(kind, "`content` must be an object"))
                }
            }
            Self::MergeConfig { config, .. } => {
                if config.is_object() {
                    Ok(())
                } else {
                    Err(DomainError::malformed(kind, "`config` must be an object"))
                }
            }
            Self::EnhanceFile {
                modifier, params, ..
            } => {
                require(modifier, "modifier")?;
                if params.is_null() || params.is_object() {
                    Ok(())
                } else {
                    Err(DomainError::malformed(kind, "`params` must be an object"))
                }
            }
            Self::AddImports { imports, .. } => {
                if imports.is_empty() {
                    return Err(DomainError::malformed(kind, "`imports` cannot be empty"));
                }
                imports.iter().try_for_each(|i| require(&i.from, "imports[].from"))
            }
            Self::AppendStatements { statements, .. } => {
                if statements.iter().all(|s| s.trim().is_empty()) {
                    return Err(DomainError::malformed(kind, "`statements` cannot be empty"));
                }
                Ok(())
            }
            Self::WrapExport {
                wrapper, import, ..
            } => {
                require(wrapper, "wrapper")?;
                match import {
                    Some(spec) => require(&spec.from, "import.from"),
                    None => Ok(()),
                }
            }
            Self::ExtendSchema {
                tables,
                table_function,
                import_from,
                ..
            } => {
                if tables.is_empty() {
                    return Err(DomainError::malformed(kind, "`tables` cannot be empty"));
                }
                require(table_function, "tableFunction")?;
                require(import_from, "importFrom")?;
                for table in tables {
                    require(&table.name, "tables[].name")?;
                    if table.columns.is_empty() {
                        return Err(DomainError::malformed(
                            kind,
                            format!("table `{}` has no columns", table.name),
                        ));
                    }
                    for column in &table.columns {
                        require(&column.name, "columns[].name")?;
                        require(&column.kind, "columns[].type")?;
                    }
                }
                Ok(())
            }
            Self::RunCommand { command, .. } => {
                require(command, "command")?;
                if command.chars().any(char::is_whitespace) {
                    return Err(DomainError::malformed(
                        kind,
                        "`command` is a single program name; pass arguments in `args`",
                    ));
                }
                Ok(())
            }
            Self::CreateFile { .. }
            | Self::OverwriteFile { .. }
            | Self::AppendToFile { .. }
            | Self::PrependToFile { .. } => Ok(()),
        }
    }

    /// Substitute template placeholders in every string field.
    pub fn resolve(&self, ctx: &ProjectContext) -> Self {
        let r = |s: &String| ctx.render(s);
        let import = |spec: &ImportSpec| ImportSpec {
            from: r(&spec.from),
            default: spec.default.as_ref().map(r),
            named: spec.named.iter().map(r).collect(),
            namespace: spec.namespace.as_ref().map(r),
            type_only: spec.type_only,
        };

        match self {
            Self::CreateFile {
                path,
                content,
                overwrite,
            } => Self::CreateFile {
                path: r(path),
                content: r(content),
                overwrite: *overwrite,
            },
            Self::OverwriteFile { path, content } => Self::OverwriteFile {
                path: r(path),
                content: r(content),
            },
            Self::AppendToFile { path, content } => Self::AppendToFile {
                path: r(path),
                content: r(content),
            },
            Self::PrependToFile { path, content } => Self::PrependToFile {
                path: r(path),
                content: r(content),
            },
            Self::ReplaceInFile {
                path,
                find,
                replace,
                all,
            } => Self::ReplaceInFile {
                path: r(path),
                find: r(find),
                replace: r(replace),
                all: *all,
            },
            Self::InstallPackages { packages, is_dev } => Self::InstallPackages {
                packages: packages.iter().map(r).collect(),
                is_dev: *is_dev,
            },
            Self::AddScript { name, command } => Self::AddScript {
                name: r(name),
                command: r(command),
            },
            Self::AddEnvVar {
                key,
                value,
                description,
            } => Self::AddEnvVar {
                key: r(key),
                value: r(value),
                description: description.as_ref().map(r),
            },
            Self::MergeJson {
                path,
                content,
                concat_arrays,
            } => Self::MergeJson {
                path: r(path),
                content: ctx.render_value(content),
                concat_arrays: *concat_arrays,
            },
            Self::MergeConfig {
                path,
                config,
                strategy,
            } => Self::MergeConfig {
                path: r(path),
                config: ctx.render_value(config),
                strategy: *strategy,
            },
            Self::EnhanceFile {
                path,
                modifier,
                params,
                fallback,
            } => Self::EnhanceFile {
                path: r(path),
                modifier: r(modifier),
                params: ctx.render_value(params),
                fallback: *fallback,
            },
            Self::AddImports { path, imports } => Self::AddImports {
                path: r(path),
                imports: imports.iter().map(import).collect(),
            },
            Self::AppendStatements { path, statements } => Self::AppendStatements {
                path: r(path),
                statements: statements.iter().map(r).collect(),
            },
            Self::WrapExport {
                path,
                wrapper,
                import: spec,
            } => Self::WrapExport {
                path: r(path),
                wrapper: r(wrapper),
                import: spec.as_ref().map(import),
            },
            Self::ExtendSchema {
                path,
                tables,
                table_function,
                import_from,
            } => Self::ExtendSchema {
                path: r(path),
                tables: tables
                    .iter()
                    .map(|t| SchemaTable {
                        name: r(&t.name),
                        table_name: t.table_name.as_ref().map(r),
                        columns: t
                            .columns
                            .iter()
                            .map(|c| SchemaColumn {
                                name: r(&c.name),
                                kind: r(&c.kind),
                                modifiers: c.modifiers.iter().map(r).collect(),
                                column_name: c.column_name.as_ref().map(r),
                            })
                            .collect(),
                    })
                    .collect(),
                table_function: r(table_function),
                import_from: r(import_from),
            },
            Self::RunCommand { command, args, cwd } => Self::RunCommand {
                command: r(command),
                args: args.iter().map(r).collect(),
                cwd: cwd.as_ref().map(r),
            },
        }
    }
}
