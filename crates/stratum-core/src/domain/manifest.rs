//! Dependency manifest fragments.
//!
//! Package installation and scripts are expressed as JSON fragments merged
//! into the manifest, never as package-manager invocations.

use serde_json::{Map, Value, json};

use crate::domain::error::DomainError;

/// Version recorded when a package specifier carries none.
pub const LATEST: &str = "latest";

/// A parsed `name[@version]` package specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
}

impl PackageSpec {
    /// Parse `name`, `name@version`, `@scope/name` or `@scope/name@version`.
    pub fn parse(spec: &str) -> Result<Self, DomainError> {
        let trimmed = spec.trim();
        let invalid = || DomainError::InvalidPackageSpec {
            spec: spec.to_string(),
        };

        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (scoped, body) = match trimmed.strip_prefix('@') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (name, version) = match body.split_once('@') {
            Some((name, version)) => {
                if version.is_empty() {
                    return Err(invalid());
                }
                (name, version)
            }
            None => (body, LATEST),
        };

        if name.is_empty() {
            return Err(invalid());
        }
        if scoped {
            match name.split_once('/') {
                Some((scope, pkg)) if !scope.is_empty() && !pkg.is_empty() => {}
                _ => return Err(invalid()),
            }
        }

        Ok(Self {
            name: if scoped {
                format!("@{name}")
            } else {
                name.to_string()
            },
            version: version.to_string(),
        })
    }
}

/// Manifest section receiving packages.
pub fn dependency_section(is_dev: bool) -> &'static str {
    if is_dev { "devDependencies" } else { "dependencies" }
}

/// `{ "dependencies": { name: version, ... } }`
pub fn dependency_fragment(packages: &[PackageSpec], is_dev: bool) -> Value {
    let entries: Map<String, Value> = packages
        .iter()
        .map(|p| (p.name.clone(), Value::String(p.version.clone())))
        .collect();

    let mut fragment = Map::new();
    fragment.insert(dependency_section(is_dev).to_string(), Value::Object(entries));
    Value::Object(fragment)
}

/// `{ "scripts": { name: command } }`
pub fn script_fragment(name: &str, command: &str) -> Value {
    json!({ "scripts": { name: command } })
}
