use crate::error::{Result, TelemetryError};
use crate::{io, paths};
use rand::Rng;
use std::path::Path;

/// Number of random bytes in a client id (hex-encoded to twice this length).
pub const CLIENT_ID_BYTES: usize = 10;

/// Generate a random lowercase hex token.
pub fn generate_id() -> String {
    hex::encode(rand::thread_rng().gen::<[u8; CLIENT_ID_BYTES]>())
}

/// Create the client id file if it does not exist yet. Returns true if an id was generated.
pub fn ensure_id(state_dir: &Path) -> Result<bool> {
    let path = paths::id_path(state_dir);
    let created = io::write_if_missing(&path, generate_id().as_bytes())?;
    if created {
        tracing::info!(path = %path.display(), "generated client id");
    }
    Ok(created)
}

pub fn get_id(state_dir: &Path) -> Result<String> {
    match io::read_optional(&paths::id_path(state_dir))? {
        Some(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        _ => Err(TelemetryError::NotInitialized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generated_ids_are_hex_and_fixed_length() {
        let id = generate_id();
        assert_eq!(id.len(), CLIENT_ID_BYTES * 2);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, generate_id());
    }

    #[test]
    fn generated_id_decodes_to_id_bytes() {
        let bytes = hex::decode(generate_id()).unwrap();
        assert_eq!(bytes.len(), CLIENT_ID_BYTES);
    }

    #[test]
    fn ensure_id_runs_once() {
        let dir = TempDir::new().unwrap();
        assert!(ensure_id(dir.path()).unwrap());
        let first = get_id(dir.path()).unwrap();
        assert!(!ensure_id(dir.path()).unwrap());
        assert_eq!(get_id(dir.path()).unwrap(), first);
    }

    #[test]
    fn get_id_before_ensure_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            get_id(dir.path()),
            Err(TelemetryError::NotInitialized)
        ));
    }
}
