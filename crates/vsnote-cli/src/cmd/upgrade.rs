use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use vsnote_core::migrations::REGISTRY;

/// `vsnote upgrade`: run the steps for `(previous, current]`, or list them with `--dry-run`.
pub fn run(
    state_dir: &Path,
    install_dir: &Path,
    current_version: Option<&str>,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = super::load_client(state_dir, current_version)?;

    if dry_run {
        let plan = client
            .plan_upgrade(install_dir, REGISTRY)
            .context("failed to plan upgrade")?;
        let (previous, current, planned) = (plan.previous, plan.current, plan.steps);

        if json {
            let steps: Vec<_> = planned
                .iter()
                .map(|s| serde_json::json!({ "version": s.version, "description": s.description }))
                .collect();
            return print_json(&serde_json::json!({
                "previous": previous.to_string(),
                "current": current.to_string(),
                "steps": steps,
            }));
        }

        println!("previous: {previous}  →  current: {current}");
        if planned.is_empty() {
            println!("No upgrade steps to run.");
        } else {
            let rows = planned
                .iter()
                .map(|s| vec![s.version.to_string(), s.description.to_string()])
                .collect();
            print_table(&["VERSION", "DESCRIPTION"], rows);
        }
        return Ok(());
    }

    let report = client
        .upgrade(install_dir, REGISTRY)
        .context("upgrade check failed")?;

    if json {
        return print_json(&report);
    }

    if !report.upgraded() {
        println!("Version {} is current; nothing to do.", report.current);
        return Ok(());
    }
    println!("Upgraded {} → {}", report.previous, report.current);
    for step in &report.steps {
        match &step.error {
            None => println!("  ok      {}  {}", step.version, step.description),
            Some(err) => println!("  FAILED  {}  {err}", step.version),
        }
    }
    Ok(())
}

/// `vsnote migrations`: list every registered step.
pub fn list(json: bool) -> anyhow::Result<()> {
    if json {
        let steps: Vec<_> = REGISTRY
            .iter()
            .map(|s| serde_json::json!({ "version": s.version, "description": s.description }))
            .collect();
        return print_json(&steps);
    }
    let rows = REGISTRY
        .iter()
        .map(|s| vec![s.version.to_string(), s.description.to_string()])
        .collect();
    print_table(&["VERSION", "DESCRIPTION"], rows);
    Ok(())
}
