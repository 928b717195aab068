use crate::output::{describe_heartbeat, print_json};
use crate::root::require_initialized;
use std::path::Path;

pub fn run(state_dir: &Path, json: bool) -> anyhow::Result<()> {
    require_initialized(state_dir)?;
    let client = super::load_client(state_dir, None)?;
    let outcome = client.heartbeat();

    if json {
        return print_json(&outcome);
    }
    println!("{}", describe_heartbeat(&outcome));
    Ok(())
}
