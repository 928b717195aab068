use crate::error::Result;
use crate::{io, paths};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Action recorded once on first run; delivered as a client-info event.
pub const INSTALLED: &str = "installed";
/// Action recorded by the daily heartbeat.
pub const ACTIVE: &str = "active";

/// Pending actions: action name → occurrence timestamps (Unix ms), oldest first.
pub type Actions = BTreeMap<String, Vec<i64>>;

/// Durable log of actions that have not been delivered yet.
///
/// An absent `actions` file is equivalent to an empty log.
#[derive(Debug, Clone)]
pub struct ActionLog {
    path: PathBuf,
}

impl ActionLog {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: paths::actions_path(state_dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted map. Missing or unreadable state yields an empty map.
    pub fn load_or_empty(&self) -> Actions {
        match self.load() {
            Ok(actions) => actions,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable action log");
                Actions::new()
            }
        }
    }

    fn load(&self) -> Result<Actions> {
        match io::read_optional(&self.path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(&data)?),
            _ => Ok(Actions::new()),
        }
    }

    /// Append an occurrence of `action` at `at` and persist the full map.
    pub fn record(&self, action: &str, at: i64) -> Result<Actions> {
        let mut actions = self.load_or_empty();
        actions.entry(action.to_string()).or_default().push(at);
        self.stage(&actions)?;
        Ok(actions)
    }

    /// Overwrite the persisted state with exactly `actions`.
    pub fn stage(&self, actions: &Actions) -> Result<()> {
        let data = serde_json::to_vec(actions)?;
        io::atomic_write(&self.path, &data)
    }

    pub fn clear(&self) -> Result<()> {
        io::remove_if_exists(&self.path)?;
        Ok(())
    }

    /// Total number of pending occurrences across all actions.
    pub fn pending_count(&self) -> usize {
        self.load_or_empty().values().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = ActionLog::new(dir.path());
        assert!(log.load_or_empty().is_empty());
        assert_eq!(log.pending_count(), 0);
    }

    #[test]
    fn record_appends_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let log = ActionLog::new(dir.path());
        log.record("open-note", 1).unwrap();
        log.record("open-note", 2).unwrap();
        log.record("search", 3).unwrap();

        let actions = log.load_or_empty();
        assert_eq!(actions["open-note"], vec![1, 2]);
        assert_eq!(actions["search"], vec![3]);
        assert_eq!(log.pending_count(), 3);
    }

    #[test]
    fn persisted_format_is_object_of_integer_arrays() {
        let dir = TempDir::new().unwrap();
        let log = ActionLog::new(dir.path());
        log.record(INSTALLED, 1_700_000_000_000).unwrap();
        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw, r#"{"installed":[1700000000000]}"#);
    }

    #[test]
    fn stage_overwrites_and_clear_removes() {
        let dir = TempDir::new().unwrap();
        let log = ActionLog::new(dir.path());
        log.record("a", 1).unwrap();

        let mut replacement = Actions::new();
        replacement.insert("b".to_string(), vec![5, 6]);
        log.stage(&replacement).unwrap();
        assert_eq!(log.load_or_empty(), replacement);

        log.clear().unwrap();
        assert!(!log.path().exists());
        log.clear().unwrap();
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let log = ActionLog::new(dir.path());
        std::fs::write(log.path(), b"{not json").unwrap();
        assert!(log.load_or_empty().is_empty());

        log.record("a", 9).unwrap();
        assert_eq!(log.load_or_empty()["a"], vec![9]);
    }
}
