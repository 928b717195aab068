use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("client not initialized: no client id in state directory")]
    NotInitialized,

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("migration {version} failed: {reason}")]
    MigrationFailed { version: String, reason: String },

    #[error("invalid version '{0}': expected semantic version (major.minor.patch)")]
    InvalidVersion(String),

    #[error("invalid timestamp marker: {0}")]
    InvalidMarker(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
