//! End-to-end tests for the `stratum` binary.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A command isolated from the user's config, env and `.env`.
fn stratum(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("stratum");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("NO_COLOR")
        .env_remove("STRATUM_CONFIG")
        .env_remove("STRATUM_BLUEPRINTS_DIR")
        .env_remove("STRATUM_INSTALL__ENABLED")
        .env_remove("STRATUM_INSTALL__PACKAGE_MANAGER");
    cmd
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Workspace with a two-module recipe and matching blueprints.
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "blueprints/base.json",
        r#"{
            "id": "base",
            "name": "Base project",
            "actions": [
                {"type": "CREATE_FILE", "path": "package.json", "content": "{\"name\": \"shop\"}"},
                {"type": "CREATE_FILE", "path": "src/index.ts", "content": "export {};\n"}
            ]
        }"#,
    );
    write(
        temp.path(),
        "blueprints/env.yaml",
        "id: env\nactions:\n  - type: ADD_ENV_VAR\n    key: DATABASE_URL\n    value: postgres://localhost/shop\n",
    );
    write(
        temp.path(),
        "recipe.json",
        r#"{
            "project": {"name": "shop"},
            "modules": [
                {"id": "base", "category": "framework"},
                {"id": "env", "category": "config"}
            ]
        }"#,
    );
    temp
}

// ── basics ────────────────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    stratum(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn version_matches_package() {
    let temp = TempDir::new().unwrap();
    stratum(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_exits_with_usage_error() {
    let temp = TempDir::new().unwrap();
    stratum(temp.path())
        .args(["generate", "--frobnicate"])
        .assert()
        .code(2);
}

// ── generate ──────────────────────────────────────────────────────────────────

#[test]
fn generate_writes_project_and_run_record() {
    let temp = workspace();
    stratum(temp.path())
        .args([
            "generate",
            "recipe.json",
            "--blueprints",
            "blueprints",
            "--output",
            "out",
            "--no-install",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/index.ts"));

    let out = temp.path().join("out");
    assert_eq!(
        fs::read_to_string(out.join("src/index.ts")).unwrap(),
        "export {};\n"
    );
    assert!(
        fs::read_to_string(out.join(".env.example"))
            .unwrap()
            .contains("DATABASE_URL=postgres://localhost/shop")
    );

    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("stratum.json")).unwrap()).unwrap();
    assert_eq!(record["project"]["name"], "shop");
    assert_eq!(record["modules"][1]["id"], "env");
}

#[test]
fn generate_defaults_root_to_project_name() {
    let temp = workspace();
    stratum(temp.path())
        .args(["gen", "recipe.json", "-b", "blueprints", "--no-install"])
        .assert()
        .success();

    assert!(temp.path().join("shop/package.json").is_file());
}

#[test]
fn dry_run_writes_nothing() {
    let temp = workspace();
    stratum(temp.path())
        .args([
            "generate",
            "recipe.json",
            "--blueprints",
            "blueprints",
            "--output",
            "out",
            "--dry-run",
            "--output-format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dryRun\": true"))
        .stdout(predicate::str::contains("stratum.json"));

    assert!(!temp.path().join("out").exists());
}

#[test]
fn failed_module_exits_5_and_writes_nothing() {
    let temp = workspace();
    write(
        temp.path(),
        "blueprints/broken.json",
        r#"{"id": "broken", "actions": [
            {"type": "RUN_COMMAND", "command": "stratum-test-no-such-program", "args": ["--x"]}
        ]}"#,
    );
    write(
        temp.path(),
        "recipe.json",
        r#"{
            "project": {"name": "shop"},
            "modules": [
                {"id": "base", "category": "framework"},
                {"id": "broken", "category": "tooling"}
            ]
        }"#,
    );

    stratum(temp.path())
        .args([
            "generate",
            "recipe.json",
            "--blueprints",
            "blueprints",
            "--output",
            "out",
            "--no-install",
        ])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("broken"))
        .stderr(predicate::str::contains("No files were written"));

    assert!(!temp.path().join("out").exists());
}

#[test]
fn non_empty_target_requires_yes() {
    let temp = workspace();
    write(temp.path(), "out/README.md", "existing\n");

    stratum(temp.path())
        .args(["generate", "recipe.json", "-b", "blueprints", "-o", "out", "--no-install"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));

    stratum(temp.path())
        .args([
            "generate", "recipe.json", "-b", "blueprints", "-o", "out", "--no-install", "--yes",
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp.path().join("out/README.md")).unwrap(),
        "existing\n"
    );
    assert!(temp.path().join("out/package.json").is_file());
}

#[test]
fn unsupported_recipe_extension_is_user_error() {
    let temp = workspace();
    write(temp.path(), "recipe.ini", "[project]\nname=shop\n");

    stratum(temp.path())
        .args(["generate", "recipe.ini", "--blueprints", "blueprints"])
        .assert()
        .code(2);
}

#[test]
fn missing_blueprint_directory_is_reported() {
    let temp = workspace();
    stratum(temp.path())
        .args(["generate", "recipe.json", "--blueprints", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("directory not found"));
}

// ── validate / list ───────────────────────────────────────────────────────────

#[test]
fn validate_accepts_complete_recipe() {
    let temp = workspace();
    stratum(temp.path())
        .args(["validate", "recipe.json", "--blueprints", "blueprints"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 module(s)"));
}

#[test]
fn validate_missing_blueprint_exits_3() {
    let temp = workspace();
    write(
        temp.path(),
        "recipe.yaml",
        "project:\n  name: shop\nmodules:\n  - id: base\n    category: framework\n  - id: ghost\n    category: database\n",
    );

    stratum(temp.path())
        .args(["validate", "recipe.yaml", "--blueprints", "blueprints"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn list_blueprints_as_json() {
    let temp = workspace();
    let output = stratum(temp.path())
        .args(["list", "--blueprints", "blueprints", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["base", "env"]);
}

#[test]
fn list_modifiers() {
    let temp = TempDir::new().unwrap();
    stratum(temp.path())
        .args(["list", "--modifiers", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("json-merger"))
        .stdout(predicate::str::contains("env-merger"));
}

// ── init / config ─────────────────────────────────────────────────────────────

#[test]
fn init_writes_config_once() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("conf/stratum.toml");
    let config_arg = config.to_str().unwrap();

    stratum(temp.path())
        .args(["--config", config_arg, "init"])
        .assert()
        .success();
    assert!(
        fs::read_to_string(&config)
            .unwrap()
            .contains("package_manager = \"npm\"")
    );

    fs::write(&config, "[install]\nenabled = false\n").unwrap();
    stratum(temp.path())
        .args(["--config", config_arg, "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
    assert_eq!(
        fs::read_to_string(&config).unwrap(),
        "[install]\nenabled = false\n"
    );

    stratum(temp.path())
        .args(["--config", config_arg, "init", "--force"])
        .assert()
        .success();
    assert!(fs::read_to_string(&config).unwrap().contains("enabled = true"));
}

#[test]
fn config_get_reads_environment() {
    let temp = TempDir::new().unwrap();
    stratum(temp.path())
        .env("STRATUM_INSTALL__PACKAGE_MANAGER", "pnpm")
        .args(["config", "get", "install.package_manager"])
        .assert()
        .success()
        .stdout(predicate::str::diff("pnpm\n"));
}

#[test]
fn config_get_unknown_key_exits_4() {
    let temp = TempDir::new().unwrap();
    stratum(temp.path())
        .args(["config", "get", "nope.key"])
        .assert()
        .code(4);
}

#[test]
fn missing_explicit_config_exits_4() {
    let temp = TempDir::new().unwrap();
    stratum(temp.path())
        .args(["--config", "absent.toml", "list", "--modifiers"])
        .assert()
        .code(4);
}

#[test]
fn completions_for_bash() {
    let temp = TempDir::new().unwrap();
    stratum(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stratum"));
}
