//! Parsed representation of an ECMAScript-style source module.
//!
//! The module is parsed with tree-sitter's TypeScript grammar and split into
//! its top-level import declarations and verbatim text. Enhancers only ever
//! add imports, append top-level statements and wrap the default export, so
//! nothing else needs a typed form. Text is never rewritten: an untouched
//! module renders back byte-for-byte.

use serde::{Deserialize, Serialize};
use tree_sitter::{Language, Node, Parser, Tree};

use crate::domain::error::DomainError;

/// An import to add to a module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpec {
    /// Module specifier, e.g. `drizzle-orm/pg-core`.
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub named: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub type_only: bool,
}

impl ImportSpec {
    pub fn named<I, S>(from: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            from: from.into(),
            named: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn default_import(from: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            default: Some(name.into()),
            ..Self::default()
        }
    }

    /// `import "./styles.css";`
    pub fn is_side_effect(&self) -> bool {
        self.default.is_none() && self.named.is_empty() && self.namespace.is_none()
    }

    fn clause(&self) -> String {
        let mut parts = Vec::new();
        if let Some(default) = &self.default {
            parts.push(default.clone());
        }
        if let Some(ns) = &self.namespace {
            parts.push(format!("* as {ns}"));
        } else if !self.named.is_empty() {
            parts.push(format!("{{ {} }}", self.named.join(", ")));
        }
        parts.join(", ")
    }

    fn render_with(&self, quote: char, trailing: &str) -> String {
        let keyword = if self.type_only { "import type" } else { "import" };
        if self.is_side_effect() {
            format!("{keyword} {quote}{}{quote}{trailing}", self.from)
        } else {
            format!(
                "{keyword} {} from {quote}{}{quote}{trailing}",
                self.clause(),
                self.from
            )
        }
    }

    /// Canonical single-line form with double quotes.
    pub fn render(&self) -> String {
        self.render_with('"', ";")
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ImportDecl {
    spec: ImportSpec,
    quote: char,
    /// Everything after the closing quote of the specifier (`;`, comments, newline).
    trailing: String,
    raw: String,
    dirty: bool,
}

impl ImportDecl {
    fn render(&self) -> String {
        if self.dirty {
            self.spec.render_with(self.quote, &self.trailing)
        } else {
            self.raw.clone()
        }
    }

    fn merge(&mut self, spec: &ImportSpec) -> bool {
        if self.spec.type_only != spec.type_only
            || self.spec.namespace.is_some()
            || spec.namespace.is_some()
            || self.spec.is_side_effect()
        {
            return false;
        }
        if let (Some(mine), Some(theirs)) = (&self.spec.default, &spec.default) {
            if mine != theirs {
                return false;
            }
        }

        if self.spec.default.is_none() && spec.default.is_some() {
            self.spec.default = spec.default.clone();
            self.dirty = true;
        }
        for name in &spec.named {
            let wanted = normalise(name);
            if !self.spec.named.iter().any(|n| normalise(n) == wanted) {
                self.spec.named.push(name.trim().to_string());
                self.dirty = true;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Import(ImportDecl),
    Text(String),
}

/// A module split into import declarations and verbatim text.
/// A module split into import declarations and verbatim text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedModule {
    segments: Vec<Segment>,
}

impl ParsedModule {
    /// Split `source` at its top-level `import` statements.
    ///
    /// Each import keeps the rest of its line (semicolon, trailing comment,
    /// newline) so that re-rendering a dirty declaration does not disturb
    /// the surrounding text.
    pub fn parse(source: &str) -> Self {
        let Some(tree) = syntax_tree(source) else {
            return Self::verbatim(source);
        };

        let root = tree.root_node();
        let mut cursor = root.walk();
        let mut segments = Vec::new();
        let mut pos = 0;

        for node in root.named_children(&mut cursor) {
            if node.kind() != "import_statement" || node.start_byte() < pos {
                continue;
            }
            let Some((spec, source_node)) = import_spec(node, source) else {
                continue;
            };

            let start = node.start_byte();
            let end = line_end_after(source, node.end_byte());
            if start > pos {
                segments.push(Segment::Text(source[pos..start].to_string()));
            }
            segments.push(Segment::Import(ImportDecl {
                spec,
                quote: text(source_node, source).chars().next().unwrap_or('"'),
                trailing: source[source_node.end_byte()..end].to_string(),
                raw: source[start..end].to_string(),
                dirty: false,
            }));
            pos = end;
        }

        if pos < source.len() {
            segments.push(Segment::Text(source[pos..].to_string()));
        }
        Self { segments }
    }

    fn verbatim(source: &str) -> Self {
        let segments = if source.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Text(source.to_string())]
        };
        Self { segments }
    }

    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Import(decl) => decl.render(),
                Segment::Text(t) => t.clone(),
            })
            .collect()
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Import(decl) => Some(&decl.spec),
            Segment::Text(_) => None,
        })
    }

    /// Whether `name` is already imported from `from`.
    pub fn imports_name(&self, from: &str, name: &str) -> bool {
        let wanted = normalise(name);
        self.imports().any(|spec| {
            spec.from == from
                && (spec.default.as_deref() == Some(name)
                    || spec.named.iter().any(|n| normalise(n) == wanted))
        })
    }

    /// Add an import, merging named specifiers into an existing declaration
    /// from the same source when possible.
    pub fn add_import(mut self, mut spec: ImportSpec) -> Self {
        if spec.is_side_effect() {
            if self.imports().any(|s| s.from == spec.from) {
                return self;
            }
            self.insert_import(spec);
            return self;
        }

        if spec.namespace.is_some() {
            let exists = self
                .imports()
                .any(|s| s.from == spec.from && s.namespace == spec.namespace);
            if !exists {
                self.insert_import(spec);
            }
            return self;
        }

        let from = spec.from.clone();
        spec.named.retain(|n| !self.imports_name(&from, n));
        if let Some(default) = &spec.default {
            if self.imports_name(&spec.from, default) {
                spec.default = None;
            }
        }
        if spec.is_side_effect() {
            return self;
        }

        let merged = self.segments.iter_mut().any(|segment| match segment {
            Segment::Import(decl) => decl.spec.from == spec.from && decl.merge(&spec),
            Segment::Text(_) => false,
        });
        if !merged {
            self.insert_import(spec);
        }
        self
    }

    /// Append a top-level statement unless the module already has an equal
    /// top-level statement. Whitespace and a trailing `;` are ignored when
    /// comparing.
    pub fn append_statement(mut self, statement: &str) -> Self {
        let statement = statement.trim();
        if statement.is_empty() {
            return self;
        }

        let mut wanted = statement_keys(statement);
        if wanted.is_empty() {
            wanted.push(statement_key(statement));
        }
        let existing = statement_keys(&self.render());
        if wanted.iter().all(|key| existing.contains(key)) {
            return self;
        }

        let mut tail = match self.segments.pop() {
            Some(Segment::Text(t)) => t,
            Some(import) => {
                self.segments.push(import);
                String::new()
            }
            None => String::new(),
        };

        let body_is_empty = self.segments.is_empty() && tail.trim().is_empty();
        if !body_is_empty {
            let rendered_tail = if tail.is_empty() { self.render() } else { tail.clone() };
            if !rendered_tail.ends_with('\n') {
                tail.push('\n');
            }
            if !rendered_tail.ends_with("\n\n") {
                tail.push('\n');
            }
        }
        tail.push_str(statement);
        tail.push('\n');
        self.segments.push(Segment::Text(tail));
        self
    }

    /// Rewrite `export default <expr>` into `export default wrapper(<expr>)`.
    ///
    /// Only the exported expression is replaced; its terminator and every
    /// byte around it are kept. A default-exported function or class
    /// declaration is wrapped as an expression.
    pub fn wrap_default_export(self, wrapper: &str) -> Result<Self, DomainError> {
        let source = self.render();
        let not_found = || DomainError::UnexpectedShape {
            path: String::new(),
            expected: "an `export default` statement",
        };

        let tree = syntax_tree(&source).ok_or_else(not_found)?;
        let root = tree.root_node();
        let mut cursor = root.walk();
        let exported = root
            .named_children(&mut cursor)
            .filter(|node| node.kind() == "export_statement" && has_token(*node, "default"))
            .find_map(|node| match node.child_by_field_name("value") {
                Some(value) => Some(value),
                None => node.child_by_field_name("declaration").filter(|decl| {
                    matches!(
                        decl.kind(),
                        "function_declaration"
                            | "generator_function_declaration"
                            | "class_declaration"
                    )
                }),
            })
            .ok_or_else(not_found)?;

        let already_wrapped = exported.kind() == "call_expression"
            && exported
                .child_by_field_name("function")
                .is_some_and(|f| text(f, &source) == wrapper);
        if already_wrapped {
            return Ok(self);
        }

        let range = exported.byte_range();
        let mut rewritten = String::with_capacity(source.len() + wrapper.len() + 2);
        rewritten.push_str(&source[..range.start]);
        rewritten.push_str(wrapper);
        rewritten.push('(');
        rewritten.push_str(&source[range.clone()]);
        rewritten.push(')');
        rewritten.push_str(&source[range.end..]);
        Ok(Self::parse(&rewritten))
    }

    fn insert_import(&mut self, spec: ImportSpec) {
        let last_import = self
            .segments
            .iter()
            .rposition(|s| matches!(s, Segment::Import(_)));

        let mut raw = spec.render();
        raw.push('\n');

        match last_import {
            Some(idx) => {
                if let Segment::Import(prev) = &self.segments[idx] {
                    if !prev.render().ends_with('\n') {
                        raw.insert(0, '\n');
                    }
                }
                self.segments.insert(idx + 1, Segment::Import(new_decl(spec, raw)));
            }
            None => {
                let (prefix, rest) = match self.segments.first() {
                    Some(Segment::Text(t)) => split_directives(t),
                    _ => (String::new(), String::new()),
                };
                if !rest.is_empty() && !rest.starts_with('\n') {
                    raw.push('\n');
                }

                let mut head = Vec::new();
                if !prefix.is_empty() {
                    head.push(Segment::Text(prefix));
                }
                head.push(Segment::Import(new_decl(spec, raw)));
                if !rest.is_empty() {
                    head.push(Segment::Text(rest));
                }

                if matches!(self.segments.first(), Some(Segment::Text(_))) {
                    self.segments.remove(0);
                }
                self.segments.splice(0..0, head);
            }
        }
    }
}

fn new_decl(spec: ImportSpec, raw: String) -> ImportDecl {
    ImportDecl {
        spec,
        quote: '"',
        trailing: ";\n".into(),
        raw,
        dirty: false,
    }
}

fn normalise(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse with the TypeScript grammar, retrying as TSX when JSX trips it up.
fn syntax_tree(source: &str) -> Option<Tree> {
    let typescript = parse_with(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), source);
    match typescript {
        Some(tree) if !tree.root_node().has_error() => Some(tree),
        fallback => parse_with(tree_sitter_typescript::LANGUAGE_TSX.into(), source)
            .filter(|tree| !tree.root_node().has_error())
            .or(fallback),
    }
}

fn parse_with(language: Language, source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&language).ok()?;
    parser.parse(source, None)
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

fn has_token(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|child| child.kind() == kind)
}

/// Read an `import_statement` node. `import x = require(...)` yields `None`
/// and stays verbatim text.
fn import_spec<'t>(node: Node<'t>, source: &str) -> Option<(ImportSpec, Node<'t>)> {
    let source_node = node.child_by_field_name("source")?;
    let quoted = text(source_node, source);
    let mut spec = ImportSpec {
        from: quoted.get(1..quoted.len().saturating_sub(1))?.to_string(),
        ..ImportSpec::default()
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "type" => spec.type_only = true,
            "import_require_clause" => return None,
            "import_clause" => read_clause(child, source, &mut spec),
            _ => {}
        }
    }
    Some((spec, source_node))
}

fn read_clause(clause: Node<'_>, source: &str, spec: &mut ImportSpec) {
    let mut cursor = clause.walk();
    for part in clause.named_children(&mut cursor) {
        match part.kind() {
            "identifier" => spec.default = Some(text(part, source).to_string()),
            "namespace_import" => {
                let mut inner = part.walk();
                spec.namespace = part
                    .named_children(&mut inner)
                    .find(|n| n.kind() == "identifier")
                    .map(|n| text(n, source).to_string());
            }
            "named_imports" => {
                let mut inner = part.walk();
                spec.named = part
                    .named_children(&mut inner)
                    .filter(|n| n.kind() == "import_specifier")
                    .map(|n| normalise(text(n, source)))
                    .collect();
            }
            _ => {}
        }
    }
}

/// Extend `end` over the rest of its line when that rest is blank or a
/// line comment.
fn line_end_after(source: &str, end: usize) -> usize {
    let rest = &source[end..];
    let line = rest.find('\n').map_or(rest, |nl| &rest[..=nl]);
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") {
        end + line.len()
    } else {
        end
    }
}

/// Comparable form of each top-level statement, comments excluded.
fn statement_keys(source: &str) -> Vec<String> {
    let Some(tree) = syntax_tree(source) else {
        return Vec::new();
    };
    let root = tree.root_node();
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|node| node.kind() != "comment")
        .map(|node| statement_key(text(node, source)))
        .collect()
}

fn statement_key(statement: &str) -> String {
    normalise(statement.trim().trim_end_matches(';'))
}

/// Split leading directive / shebang lines (`"use client";`, `#!/usr/bin/env node`).
fn split_directives(text: &str) -> (String, String) {
    let mut prefix_len = 0;
    for line in text.split_inclusive('\n') {
        let t = line.trim();
        let is_directive = t.starts_with("#!")
            || t.starts_with("\"use ")
            || t.starts_with("'use ");
        if !is_directive {
            break;
        }
        prefix_len += line.len();
    }
    (text[..prefix_len].to_string(), text[prefix_len..].to_string())
}
