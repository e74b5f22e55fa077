//! End-to-end runs of the orchestrator against the real adapters.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use stratum_adapters::{InMemoryStore, LocalFilesystem, MemoryFilesystem, SystemCommandRunner};
use stratum_core::application::ports::{CommandInvocation, CommandOutput, CommandRunner};
use stratum_core::domain::merge::deep_merge;
use stratum_core::domain::{ArrayPolicy, Blueprint, ModuleSpec, ModuleStatus, ProjectMeta, Recipe};
use stratum_core::error::StratumResult;
use stratum_core::prelude::{Orchestrator, RunOptions};

/// Replies to every command with a fixed exit code and records what it saw.
struct FakeRunner {
    exit_code: i32,
    seen: Mutex<Vec<CommandInvocation>>,
}

impl FakeRunner {
    fn exiting(exit_code: i32) -> Arc<Self> {
        Arc::new(Self {
            exit_code,
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &CommandInvocation) -> StratumResult<CommandOutput> {
        self.seen.lock().unwrap().push(invocation.clone());
        Ok(CommandOutput {
            exit_code: Some(self.exit_code),
            stdout: String::new(),
            stderr: "boom".into(),
        })
    }
}

fn blueprint(id: &str, actions: Value) -> Blueprint {
    Blueprint::from_value(json!({ "id": id, "actions": actions })).unwrap()
}

fn store(blueprints: Vec<Blueprint>) -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::from_blueprints(blueprints).unwrap())
}

fn recipe(modules: &[(&str, &str)]) -> Recipe {
    modules
        .iter()
        .fold(Recipe::new(ProjectMeta::new("shop")), |recipe, (id, category)| {
            recipe.with_module(ModuleSpec::new(*id, *category))
        })
}

fn offline() -> RunOptions {
    RunOptions {
        dry_run: false,
        install: false,
    }
}

fn read_json(fs: &MemoryFilesystem, path: &str) -> Value {
    serde_json::from_str(&fs.read_file(path).expect("file missing")).unwrap()
}

#[test]
fn create_twice_keeps_first_content() {
    let fs = MemoryFilesystem::new();
    let orchestrator = Orchestrator::new(
        store(vec![blueprint(
            "web",
            json!([
                {"type": "CREATE_FILE", "path": "README.md", "content": "first"},
                {"type": "CREATE_FILE", "path": "README.md", "content": "second"}
            ]),
        )]),
        Arc::new(fs.clone()),
        FakeRunner::exiting(0),
    );

    let report = orchestrator.run(&recipe(&[("web", "framework")]), "/out", offline());

    assert!(report.success, "{:?}", report.errors);
    assert_eq!(fs.read_file("/out/README.md").as_deref(), Some("first"));
    // README.md and the run record
    assert_eq!(fs.write_count(), 2);
}

#[test]
fn sequential_json_merges_equal_one_combined_merge() {
    let a = json!({"compilerOptions": {"strict": true, "paths": {"@/*": ["./src/*"]}}});
    let b = json!({"compilerOptions": {"target": "es2022"}, "include": ["src"]});
    let mut combined = a.clone();
    deep_merge(&mut combined, &b, ArrayPolicy::Replace);

    let run = |actions: Value| {
        let fs = MemoryFilesystem::new();
        let report = Orchestrator::new(
            store(vec![blueprint("ts", actions)]),
            Arc::new(fs.clone()),
            FakeRunner::exiting(0),
        )
        .run(&recipe(&[("ts", "tooling")]), "/out", offline());
        assert!(report.success, "{:?}", report.errors);
        read_json(&fs, "/out/tsconfig.json")
    };

    let sequential = run(json!([
        {"type": "MERGE_JSON", "path": "tsconfig.json", "content": a},
        {"type": "MERGE_JSON", "path": "tsconfig.json", "content": b}
    ]));
    let single = run(json!([
        {"type": "MERGE_JSON", "path": "tsconfig.json", "content": combined}
    ]));

    assert_eq!(sequential, single);
}

#[test]
fn failed_module_leaves_storage_untouched() {
    let fs = MemoryFilesystem::new().with_file("/out/existing.txt", "keep");
    let orchestrator = Orchestrator::new(
        store(vec![
            blueprint("web", json!([{"type": "CREATE_FILE", "path": "a.ts", "content": "a"}])),
            blueprint("db", json!([{"type": "CREATE_FILE", "path": "b.ts", "content": "b"}])),
            blueprint(
                "auth",
                json!([{"type": "ENHANCE_FILE", "path": "a.ts", "modifier": "not-registered"}]),
            ),
        ]),
        Arc::new(fs.clone()),
        FakeRunner::exiting(0),
    );

    let report = orchestrator.run(
        &recipe(&[("web", "framework"), ("db", "database"), ("auth", "auth")]),
        "/out",
        offline(),
    );

    assert!(!report.success);
    assert_eq!(report.modules_executed, 2);
    assert_eq!(fs.write_count(), 0);
    assert_eq!(fs.list_files(), vec![PathBuf::from("/out/existing.txt")]);
}

#[test]
fn later_modules_observe_earlier_writes() {
    let fs = MemoryFilesystem::new();
    let orchestrator = Orchestrator::new(
        store(vec![
            blueprint(
                "web",
                json!([{"type": "CREATE_FILE", "path": "next.config.json", "content": "{\"reactStrictMode\": true}"}]),
            ),
            blueprint(
                "images",
                json!([{
                    "type": "ENHANCE_FILE",
                    "path": "next.config.json",
                    "modifier": "json-merger",
                    "params": {"content": {"images": {"unoptimized": true}}}
                }]),
            ),
            blueprint(
                "notes",
                json!([{"type": "REPLACE_IN_FILE", "path": "next.config.json", "find": "unoptimized", "replace": "remotePatterns"}]),
            ),
        ]),
        Arc::new(fs.clone()),
        FakeRunner::exiting(0),
    );

    let report = orchestrator.run(
        &recipe(&[("web", "framework"), ("images", "ui"), ("notes", "docs")]),
        "/out",
        offline(),
    );

    assert!(report.success, "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(
        read_json(&fs, "/out/next.config.json"),
        json!({"reactStrictMode": true, "images": {"remotePatterns": true}})
    );
}

#[test]
fn env_vars_never_create_a_live_env_file() {
    let env_blueprint = || {
        blueprint(
            "auth",
            json!([{"type": "ADD_ENV_VAR", "key": "AUTH_SECRET", "value": "changeme", "description": "Session key"}]),
        )
    };

    let fresh = MemoryFilesystem::new();
    let report = Orchestrator::new(
        store(vec![env_blueprint()]),
        Arc::new(fresh.clone()),
        FakeRunner::exiting(0),
    )
    .run(&recipe(&[("auth", "auth")]), "/out", offline());
    assert!(report.success, "{:?}", report.errors);
    assert_eq!(
        fresh.read_file("/out/.env.example").as_deref(),
        Some("# Session key\nAUTH_SECRET=changeme\n")
    );
    assert_eq!(fresh.read_file("/out/.env"), None);

    let existing =
        MemoryFilesystem::new().with_file("/out/.env", "DATABASE_URL=postgres://local\n");
    let report = Orchestrator::new(
        store(vec![env_blueprint()]),
        Arc::new(existing.clone()),
        FakeRunner::exiting(0),
    )
    .run(&recipe(&[("auth", "auth")]), "/out", offline());
    assert!(report.success, "{:?}", report.errors);
    let live = existing.read_file("/out/.env").unwrap();
    assert!(live.starts_with("DATABASE_URL=postgres://local\n"));
    assert!(live.contains("AUTH_SECRET=changeme"));
}

#[test]
fn packages_merge_into_the_framework_manifest() {
    let fs = MemoryFilesystem::new();
    let mut recipe = recipe(&[("framework", "framework"), ("database", "database")]);
    recipe.project.manifest = Some("manifest.json".into());

    let orchestrator = Orchestrator::new(
        store(vec![
            blueprint(
                "framework",
                json!([{
                    "type": "CREATE_FILE",
                    "path": "manifest.json",
                    "content": "{\"dependencies\": {\"core-lib\": \"1.0.0\"}}\n"
                }]),
            ),
            blueprint(
                "database",
                json!([{"type": "INSTALL_PACKAGES", "packages": ["db-driver@2.0.0"]}]),
            ),
        ]),
        Arc::new(fs.clone()),
        FakeRunner::exiting(0),
    );

    let report = orchestrator.run(&recipe, "/out", offline());

    assert!(report.success, "{:?}", report.errors);
    assert_eq!(
        read_json(&fs, "/out/manifest.json"),
        json!({"dependencies": {"core-lib": "1.0.0", "db-driver": "2.0.0"}})
    );
}

#[test]
fn skipped_enhancement_is_a_warning() {
    let fs = MemoryFilesystem::new();
    let orchestrator = Orchestrator::new(
        store(vec![blueprint(
            "sentry",
            json!([{
                "type": "ENHANCE_FILE",
                "path": "next.config.js",
                "modifier": "module-enhancer",
                "params": {"statements": ["init();"]},
                "fallback": "skip"
            }]),
        )]),
        Arc::new(fs.clone()),
        FakeRunner::exiting(0),
    );

    let report = orchestrator.run(&recipe(&[("sentry", "monitoring")]), "/out", offline());

    assert!(report.success, "{:?}", report.errors);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("[sentry]"));
    assert_eq!(fs.read_file("/out/next.config.js"), None);
}

#[test]
fn failing_command_in_second_module_stops_the_run() {
    let fs = MemoryFilesystem::new();
    let runner = FakeRunner::exiting(2);
    let orchestrator = Orchestrator::new(
        store(vec![
            blueprint("web", json!([{"type": "CREATE_FILE", "path": "index.ts", "content": "x"}])),
            blueprint(
                "db",
                json!([{"type": "RUN_COMMAND", "command": "npx", "args": ["drizzle-kit", "generate"]}]),
            ),
            blueprint("ui", json!([{"type": "CREATE_FILE", "path": "ui.ts", "content": "y"}])),
        ]),
        Arc::new(fs.clone()),
        runner.clone(),
    );

    let report = orchestrator.run(
        &recipe(&[("web", "framework"), ("db", "database"), ("ui", "ui")]),
        "/out",
        offline(),
    );

    assert!(!report.success);
    assert_eq!(report.modules_executed, 1);
    assert_eq!(report.modules[1].status, ModuleStatus::Failed);
    assert_eq!(report.modules[2].status, ModuleStatus::Pending);
    assert!(report.errors[0].contains("RUN_COMMAND failed"));
    assert_eq!(fs.write_count(), 0);

    let seen = runner.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].args, vec!["drizzle-kit", "generate"]);
}

#[test]
fn generates_onto_real_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("shop");
    let orchestrator = Orchestrator::new(
        store(vec![blueprint(
            "web",
            json!([
                {"type": "CREATE_FILE", "path": "src/{{module.id}}.ts", "content": "export const name = \"{{project.name}}\";\n"},
                {"type": "ADD_SCRIPT", "name": "dev", "command": "next dev"}
            ]),
        )]),
        Arc::new(LocalFilesystem::new()),
        Arc::new(SystemCommandRunner::new()),
    );

    let report = orchestrator.run(&recipe(&[("web", "framework")]), &root, offline());

    assert!(report.success, "{:?}", report.errors);
    assert_eq!(
        std::fs::read_to_string(root.join("src/web.ts")).unwrap(),
        "export const name = \"shop\";\n"
    );
    let manifest: Value =
        serde_json::from_str(&std::fs::read_to_string(root.join("package.json")).unwrap()).unwrap();
    assert_eq!(manifest["scripts"]["dev"], "next dev");
    assert!(root.join("stratum.json").is_file());
}

#[test]
fn dry_run_creates_nothing_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("shop");
    let orchestrator = Orchestrator::new(
        store(vec![blueprint("web", json!([{"type": "CREATE_FILE", "path": "a.ts"}]))]),
        Arc::new(LocalFilesystem::new()),
        Arc::new(SystemCommandRunner::new()),
    );

    let report = orchestrator.run(
        &recipe(&[("web", "framework")]),
        &root,
        RunOptions {
            dry_run: true,
            install: true,
        },
    );

    assert!(report.success);
    assert_eq!(report.files_written, vec!["a.ts", "stratum.json"]);
    assert!(!Path::new(&root).exists());
}
