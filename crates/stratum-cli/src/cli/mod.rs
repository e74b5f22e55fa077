//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, LogFormat, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stratum",
    bin_name = "stratum",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Recipe-driven project scaffolding",
    long_about = "Stratum applies a recipe of technology modules to a project. \
                  Every module's blueprint runs against an in-memory file system; \
                  nothing is written unless every module succeeds.",
    after_help = "EXAMPLES:\n\
        \x20 stratum generate recipe.yaml --output ./shop\n\
        \x20 stratum validate recipe.yaml --blueprints ./blueprints\n\
        \x20 stratum list --modifiers\n\
        \x20 stratum completions bash > /usr/share/bash-completion/completions/stratum",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a project from a recipe.
    #[command(
        visible_alias = "gen",
        about = "Generate a project from a recipe",
        after_help = "EXAMPLES:\n\
            \x20 stratum generate recipe.yaml\n\
            \x20 stratum generate recipe.json --output ./apps/web --no-install\n\
            \x20 stratum generate recipe.toml --dry-run --output-format json"
    )]
    Generate(GenerateArgs),

    /// Check a recipe and its blueprints without writing anything.
    #[command(
        about = "Validate a recipe against the available blueprints",
        after_help = "EXAMPLES:\n\
            \x20 stratum validate recipe.yaml\n\
            \x20 stratum validate recipe.yaml --blueprints ./blueprints"
    )]
    Validate(ValidateArgs),

    /// List available blueprints or modifiers.
    #[command(
        visible_alias = "ls",
        about = "List available blueprints",
        after_help = "EXAMPLES:\n\
            \x20 stratum list\n\
            \x20 stratum list --format json\n\
            \x20 stratum list --modifiers"
    )]
    List(ListArgs),

    /// Initialise a Stratum configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 stratum init\n\
            \x20 stratum --config ./stratum.toml init --force"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stratum completions bash > ~/.local/share/bash-completion/completions/stratum\n\
            \x20 stratum completions zsh  > ~/.zfunc/_stratum\n\
            \x20 stratum completions fish > ~/.config/fish/completions/stratum.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the effective configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 stratum config get install.package_manager\n\
            \x20 stratum config list\n\
            \x20 stratum config path"
    )]
    Config(ConfigCommands),
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `stratum generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Recipe document (`.json`, `.yaml`, `.yml` or `.toml`).
    #[arg(value_name = "RECIPE", help = "Recipe file")]
    pub recipe: PathBuf,

    /// Project root to generate into.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Project directory (default: the recipe's project root or ./<name>)"
    )]
    pub output: Option<PathBuf>,

    /// Blueprint directory.
    #[arg(
        short = 'b',
        long = "blueprints",
        value_name = "DIR",
        help = "Blueprint directory"
    )]
    pub blueprints: Option<PathBuf>,

    /// Execute every module but write nothing.
    #[arg(long = "dry-run", help = "Show what would be written without writing")]
    pub dry_run: bool,

    /// Skip the dependency installation step.
    #[arg(long = "no-install", help = "Do not install dependencies after generation")]
    pub no_install: bool,

    /// Skip the confirmation prompt for non-empty directories.
    #[arg(
        short = 'y',
        long = "yes",
        help = "Generate into a non-empty directory without asking"
    )]
    pub yes: bool,
}

// ── validate ──────────────────────────────────────────────────────────────────

/// Arguments for `stratum validate`.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Recipe document.
    #[arg(value_name = "RECIPE", help = "Recipe file")]
    pub recipe: PathBuf,

    /// Blueprint directory.
    #[arg(
        short = 'b',
        long = "blueprints",
        value_name = "DIR",
        help = "Blueprint directory"
    )]
    pub blueprints: Option<PathBuf>,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `stratum list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Blueprint directory.
    #[arg(
        short = 'b',
        long = "blueprints",
        value_name = "DIR",
        help = "Blueprint directory"
    )]
    pub blueprints: Option<PathBuf>,

    /// List registered modifiers instead of blueprints.
    #[arg(long = "modifiers", help = "List built-in modifiers")]
    pub modifiers: bool,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One id per line.
    List,
    /// JSON array.
    Json,
    /// CSV rows.
    Csv,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `stratum init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stratum completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `stratum config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `install.package_manager`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_generate_command() {
        let cli = Cli::parse_from([
            "stratum",
            "generate",
            "recipe.yaml",
            "--output",
            "out",
            "--dry-run",
            "--no-install",
        ]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected Generate command");
        };
        assert_eq!(args.recipe, PathBuf::from("recipe.yaml"));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert!(args.dry_run);
        assert!(args.no_install);
        assert!(!args.yes);
    }

    #[test]
    fn gen_alias() {
        let cli = Cli::parse_from(["stratum", "gen", "r.json"]);
        assert!(matches!(cli.command, Commands::Generate(_)));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["stratum", "list", "-vv", "--output-format", "json"]);
        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.output_format, OutputFormat::Json);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        // clap should reject --quiet --verbose together
        let result = Cli::try_parse_from(["stratum", "--quiet", "--verbose", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_get_requires_key() {
        assert!(Cli::try_parse_from(["stratum", "config", "get"]).is_err());
    }
}
