use serde::Serialize;
use vsnote_core::dispatcher::FlushOutcome;
use vsnote_core::heartbeat::HeartbeatOutcome;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print `rows` under `headers` as space-padded columns with a dashed rule.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:width$}"))
            .collect();
        println!("{}", padded.join("  ").trim_end());
    };

    line(headers.to_vec());
    let rules: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    line(rules.iter().map(String::as_str).collect());
    for row in &rows {
        line(row.iter().map(String::as_str).collect());
    }
}

pub fn describe_flush(outcome: &FlushOutcome) -> String {
    match outcome {
        FlushOutcome::Empty => "nothing pending".to_string(),
        FlushOutcome::Delivered { events } => format!("delivered {events} event(s)"),
        FlushOutcome::Restaged {
            delivered_before_failure,
            pending,
            error,
        } => format!(
            "delivery failed after {delivered_before_failure} event(s); {pending} action(s) kept for retry ({error})"
        ),
    }
}

pub fn describe_heartbeat(outcome: &HeartbeatOutcome) -> String {
    match outcome {
        HeartbeatOutcome::Skipped { next_boundary } => {
            format!("already active today (next after {})", next_boundary.to_rfc3339())
        }
        HeartbeatOutcome::Sent { flush } => format!("active recorded, {}", describe_flush(flush)),
        HeartbeatOutcome::Failed { error } => format!("failed: {error}"),
    }
}
