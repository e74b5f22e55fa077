//! Implementation of the `stratum list` command.

use std::sync::Arc;

use serde::Serialize;

use stratum_core::application::{BlueprintInfo, BlueprintService, ModifierRegistry};

use crate::{
    cli::{ListArgs, ListFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct ModifierInfo {
    name: String,
    description: String,
}

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    if args.modifiers {
        let modifiers: Vec<ModifierInfo> = ModifierRegistry::with_builtin()
            .describe()
            .into_iter()
            .map(|(name, description)| ModifierInfo { name, description })
            .collect();
        return print_modifiers(&modifiers, args.format, &output);
    }

    let store = super::load_blueprints(args.blueprints.as_deref(), &config)?;
    let blueprints = BlueprintService::new(Arc::new(store)).list()?;
    print_blueprints(&blueprints, args.format, &output)
}

fn print_blueprints(
    blueprints: &[BlueprintInfo],
    format: ListFormat,
    output: &OutputManager,
) -> CliResult<()> {
    match format {
        ListFormat::Table => {
            output.header("Available Blueprints:")?;
            if blueprints.is_empty() {
                output.print("  (none)")?;
            }
            for b in blueprints {
                output.print(&format!(
                    "  {:<24} {:<10} {:>3} action(s)  {}",
                    b.id,
                    b.version,
                    b.action_count,
                    b.description.as_deref().unwrap_or("")
                ))?;
            }
        }
        // JSON, list and CSV go to stdout unconditionally so they stay
        // parseable in pipes, quiet or not.
        ListFormat::Json => output.json(&blueprints)?,
        ListFormat::List => {
            for b in blueprints {
                println!("{}", b.id);
            }
        }
        ListFormat::Csv => {
            println!("id,name,version,actions");
            for b in blueprints {
                println!(
                    "{},{},{},{}",
                    b.id,
                    csv_field(&b.name),
                    b.version,
                    b.action_count
                );
            }
        }
    }
    Ok(())
}

fn print_modifiers(
    modifiers: &[ModifierInfo],
    format: ListFormat,
    output: &OutputManager,
) -> CliResult<()> {
    match format {
        ListFormat::Table => {
            output.header("Available Modifiers:")?;
            for m in modifiers {
                output.print(&format!("  {:<18} {}", m.name, m.description))?;
            }
        }
        ListFormat::Json => output.json(&modifiers)?,
        ListFormat::List => {
            for m in modifiers {
                println!("{}", m.name);
            }
        }
        ListFormat::Csv => {
            println!("name,description");
            for m in modifiers {
                println!("{},{}", m.name, csv_field(&m.description));
            }
        }
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
