use anyhow::Context;
use std::path::{Path, PathBuf};

/// Resolve the client state directory.
///
/// Priority:
/// 1. `--state-dir` flag / `VSNOTE_STATE_DIR` env var (passed in as `explicit`)
/// 2. `~/.vscode-note`
pub fn resolve_state_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    vsnote_core::paths::default_state_dir().context("cannot determine state directory")
}

/// Fail unless `vsnote init` has written a client id into `state_dir`.
pub fn require_initialized(state_dir: &Path) -> anyhow::Result<()> {
    if vsnote_core::identity::get_id(state_dir).is_err() {
        anyhow::bail!(
            "not initialized: run 'vsnote init' first (no client id in {})",
            state_dir.display()
        );
    }
    Ok(())
}
