use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use vsnote_core::config::{TelemetryConfig, WarnLevel};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write the effective configuration to config.yaml
    Write,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(state_dir: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let config = TelemetryConfig::load(state_dir).context("failed to load config")?;
    match subcmd {
        ConfigSubcommand::Show => show(&config, json),
        ConfigSubcommand::Validate => validate(&config, json),
        ConfigSubcommand::Write => {
            config.save().context("failed to write config.yaml")?;
            println!(
                "wrote {}",
                vsnote_core::paths::config_path(state_dir).display()
            );
            Ok(())
        }
    }
}

fn show(config: &TelemetryConfig, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(config);
    }
    let on_off = |enabled: bool| if enabled { "enabled" } else { "disabled" };
    println!("state_dir:    {}", config.state_dir.display());
    println!("identifier:   {}", config.identifier);
    println!(
        "collector:    {} ({})",
        config.collector.url,
        on_off(config.collector.enabled)
    );
    println!(
        "analytics:    {} tid={} ({})",
        config.analytics.url,
        config.analytics.tracking_id,
        on_off(config.analytics.enabled)
    );
    println!("timeout_secs: {}", config.timeout_secs);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config: &TelemetryConfig, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
