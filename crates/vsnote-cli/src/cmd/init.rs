use crate::output::{describe_heartbeat, print_json};
use anyhow::Context;
use std::path::Path;
use vsnote_core::migrations::REGISTRY;

/// `vsnote init`: the extension's activation sequence.
pub fn run(
    state_dir: &Path,
    install_dir: &Path,
    current_version: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let client = super::load_client(state_dir, current_version)?;
    let report = client
        .init(install_dir, REGISTRY)
        .with_context(|| format!("failed to initialize {}", state_dir.display()))?;

    if json {
        return print_json(&report);
    }

    println!("State directory: {}", state_dir.display());
    if report.first_run {
        println!("  first run: client id generated, install recorded");
    }

    match &report.upgrade {
        Some(upgrade) if upgrade.upgraded() => {
            println!("  upgrade: {} → {}", upgrade.previous, upgrade.current);
            for step in &upgrade.steps {
                let mark = if step.ok { "ok" } else { "FAILED" };
                println!("    {:<8} {:<6} {}", step.version, mark, step.description);
                if let Some(err) = &step.error {
                    println!("             {err}");
                }
            }
        }
        Some(upgrade) => println!("  version: {} (no upgrade)", upgrade.current),
        None => println!("  upgrade check skipped (see log)"),
    }

    println!("  heartbeat: {}", describe_heartbeat(&report.heartbeat));
    Ok(())
}
