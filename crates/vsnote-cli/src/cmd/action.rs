use crate::output::{describe_flush, print_json};
use crate::root::require_initialized;
use std::path::Path;

/// `vsnote record <action>`: append the action, then flush everything pending.
pub fn record(state_dir: &Path, action: &str, json: bool) -> anyhow::Result<()> {
    require_initialized(state_dir)?;
    if action.trim().is_empty() {
        anyhow::bail!("action name must not be empty");
    }
    let client = super::load_client(state_dir, None)?;
    let outcome = client.record(action);

    if json {
        return print_json(&outcome);
    }
    println!("recorded '{action}': {}", describe_flush(&outcome));
    Ok(())
}

/// `vsnote flush`: retry delivery of pending actions.
pub fn flush(state_dir: &Path, json: bool) -> anyhow::Result<()> {
    require_initialized(state_dir)?;
    let client = super::load_client(state_dir, None)?;
    let outcome = client.flush();

    if json {
        return print_json(&outcome);
    }
    println!("{}", describe_flush(&outcome));
    Ok(())
}
