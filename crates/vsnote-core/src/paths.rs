use crate::error::{Result, TelemetryError};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

/// Per-user state directory, relative to the home directory.
pub const STATE_DIR: &str = ".vscode-note";

pub const ID_FILE: &str = "id";
pub const LEGACY_ID_FILE: &str = "clientId";
pub const ACTIONS_FILE: &str = "actions";
pub const ACTIVE_FILE: &str = "active";
pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Default state directory: `~/.vscode-note`.
pub fn default_state_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|h| h.join(STATE_DIR))
        .ok_or(TelemetryError::HomeNotFound)
}

pub fn id_path(state_dir: &Path) -> PathBuf {
    state_dir.join(ID_FILE)
}

pub fn legacy_id_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LEGACY_ID_FILE)
}

pub fn actions_path(state_dir: &Path) -> PathBuf {
    state_dir.join(ACTIONS_FILE)
}

pub fn active_path(state_dir: &Path) -> PathBuf {
    state_dir.join(ACTIVE_FILE)
}

pub fn config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let dir = Path::new("/tmp/state");
        assert_eq!(id_path(dir), PathBuf::from("/tmp/state/id"));
        assert_eq!(actions_path(dir), PathBuf::from("/tmp/state/actions"));
        assert_eq!(active_path(dir), PathBuf::from("/tmp/state/active"));
        assert_eq!(config_path(dir), PathBuf::from("/tmp/state/config.yaml"));
    }
}
