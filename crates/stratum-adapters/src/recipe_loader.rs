//! Recipe documents from disk.
//!
//! The format follows the extension: `.json`, `.yaml`/`.yml` or `.toml`.

use std::fs;
use std::path::Path;

use tracing::{debug, instrument};

use stratum_core::{
    application::ApplicationError,
    domain::{DocumentFormat, DomainError, Recipe},
    error::StratumResult,
};

/// Read and decode a recipe. Structural validation is left to the orchestrator.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_recipe(path: impl AsRef<Path>) -> StratumResult<Recipe> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let format = DocumentFormat::from_extension(path.extension().and_then(|e| e.to_str()))
        .ok_or_else(|| {
            DomainError::InvalidRecipe(format!(
                "unsupported recipe format '{display}' (expected .json, .yaml, .yml or .toml)"
            ))
        })?;

    let raw = fs::read_to_string(path).map_err(|e| ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to read recipe: {e}"),
    })?;

    let document = format.parse(&display, &raw)?;
    let recipe: Recipe = serde_json::from_value(document)
        .map_err(|e| DomainError::InvalidRecipe(format!("{display}: {e}")))?;

    debug!(
        project = %recipe.project.name,
        modules = recipe.modules.len(),
        "recipe loaded"
    );
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::error::StratumError;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_yaml_recipe() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "recipe.yaml",
            "project:\n  name: shop\n  framework: nextjs\nmodules:\n  - id: nextjs\n    category: framework\n  - id: drizzle\n    category: database\n    version: 0.30.0\n",
        );

        let recipe = load_recipe(&path).unwrap();
        assert_eq!(recipe.project.name, "shop");
        assert_eq!(recipe.modules.len(), 2);
        assert_eq!(recipe.modules[1].version, "0.30.0");
        assert_eq!(recipe.modules[0].version, "latest");
    }

    #[test]
    fn loads_toml_recipe() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "recipe.toml",
            "[project]\nname = \"api\"\n\n[[modules]]\nid = \"hono\"\ncategory = \"framework\"\n",
        );
        assert_eq!(load_recipe(&path).unwrap().modules[0].id, "hono");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "recipe.ini", "name=x");
        let err = load_recipe(&path).unwrap_err();
        assert!(matches!(err, StratumError::Domain(DomainError::InvalidRecipe(_))));
    }

    #[test]
    fn missing_project_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "recipe.json", r#"{"modules": []}"#);
        let err = load_recipe(&path).unwrap_err();
        assert!(err.to_string().contains("project"));
    }

    #[test]
    fn missing_file_is_a_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_recipe(dir.path().join("none.json")).unwrap_err();
        assert!(matches!(
            err,
            StratumError::Application(ApplicationError::FilesystemError { .. })
        ));
    }
}
