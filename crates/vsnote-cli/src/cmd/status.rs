use crate::output::{print_json, print_table};
use chrono::{Local, TimeZone};
use std::path::Path;

pub fn run(state_dir: &Path, json: bool) -> anyhow::Result<()> {
    let client = super::load_client(state_dir, None)?;
    let status = client.status();

    if json {
        return print_json(&status);
    }

    println!("State directory: {}", state_dir.display());
    println!(
        "Client id:       {}",
        status.client_id.as_deref().unwrap_or("(not initialized)")
    );
    match status.last_active {
        Some(at) => println!(
            "Last active:     {}",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!("Last active:     never"),
    }

    if status.pending.is_empty() {
        println!("\nNo pending actions.");
        return Ok(());
    }

    println!("\nPending actions:");
    let rows: Vec<Vec<String>> = status
        .pending
        .iter()
        .map(|(action, timestamps)| {
            vec![
                action.clone(),
                timestamps.len().to_string(),
                timestamps
                    .first()
                    .map(|&ms| format_millis(ms))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ACTION", "COUNT", "FIRST"], rows);
    Ok(())
}

fn format_millis(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}
