use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use overdesk::config::errors::{
    ERR_CLI_MISSING_ARG, ERR_CLI_MISSING_COMMAND, ERR_CLI_UNKNOWN_COMMAND, ERR_STORE_IO,
};
use overdesk::visibility::VisibilityEngine;
use overdesk::{builtin_registry, init_tracing, open_store, ShellConfig};

fn main() -> ExitCode {
    init_tracing();
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!(target = "overdesk", "no .env loaded: {err}");
    }
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("overdesk-cli: {err:?}");
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return Err(anyhow!("{ERR_CLI_MISSING_COMMAND}: missing command"));
    }
    let cmd = args.remove(0);
    if matches!(cmd.as_str(), "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let config = ShellConfig::from_env();
    tracing::debug!(target = "overdesk", config = %config.summary(), "cli config");
    let store = open_store(&config)
        .with_context(|| format!("{ERR_STORE_IO}: failed to open preference store"))?;
    let mut engine = VisibilityEngine::load(builtin_registry(), store)
        .with_context(|| format!("{ERR_STORE_IO}: failed to load visibility state"))?;

    match cmd.as_str() {
        "modules" => {
            for module in engine.registry().iter() {
                let marker = if engine.is_visible(module.id.as_str()) { " " } else { "-" };
                println!(
                    "{marker} {:<20} {:<24} {}",
                    module.id.as_str(),
                    module.label,
                    module.category.label()
                );
            }
        }
        "hidden" => {
            for id in engine.hidden().iter() {
                println!("{id}");
            }
            let stats = engine.stats();
            println!(
                "{} of {} visible ({}%)",
                stats.visible, stats.total, stats.percent_active
            );
        }
        "toggle" => {
            let id = arg(&args, 0, "toggle expects a module id")?;
            let hidden = engine.toggle(id)?;
            println!("{id}: {}", if hidden { "hidden" } else { "visible" });
        }
        "presets" => {
            let active = engine.active_preset().map(str::to_string);
            for preset in engine.presets() {
                let marker = if active.as_deref() == Some(preset.id.as_str()) { "*" } else { " " };
                println!(
                    "{marker} {:<38} {:<20} hides {}",
                    preset.id,
                    preset.label,
                    preset.hidden_ids.len()
                );
            }
        }
        "apply" => {
            let preset = arg(&args, 0, "apply expects a preset id")?;
            engine.apply_preset(preset)?;
            println!("applied {preset}");
        }
        "save" => {
            let name = match args.first() {
                Some(_) => args.join(" "),
                None => engine.suggested_preset_name(),
            };
            let preset = engine.save_preset(&name)?;
            println!("saved {} ({})", preset.label, preset.id);
        }
        "show-all" => {
            engine.show_all()?;
            println!("all modules visible");
        }
        other => return Err(anyhow!("{ERR_CLI_UNKNOWN_COMMAND}: unknown command '{other}'")),
    }
    Ok(())
}

fn arg<'a>(args: &'a [String], idx: usize, what: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .with_context(|| format!("{ERR_CLI_MISSING_ARG}: {what}"))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  overdesk-cli modules");
    eprintln!("  overdesk-cli hidden");
    eprintln!("  overdesk-cli toggle <module-id>");
    eprintln!("  overdesk-cli presets");
    eprintln!("  overdesk-cli apply <preset-id>");
    eprintln!("  overdesk-cli save [name]");
    eprintln!("  overdesk-cli show-all");
}
