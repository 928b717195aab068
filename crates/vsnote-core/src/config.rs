use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// CollectorConfig
// ---------------------------------------------------------------------------

/// Primary event collector. Receives one POST per action event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectorConfig {
    #[serde(default = "default_collector_url")]
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_collector_url() -> String {
    "https://hooks.slack.com/services/vsnote/telemetry".to_string()
}

fn default_enabled() -> bool {
    true
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            url: default_collector_url(),
            enabled: default_enabled(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnalyticsConfig
// ---------------------------------------------------------------------------

/// Secondary analytics endpoint, pinged with a form-encoded event hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    #[serde(default = "default_analytics_url")]
    pub url: String,
    #[serde(default = "default_tracking_id")]
    pub tracking_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_analytics_url() -> String {
    "https://www.google-analytics.com/collect".to_string()
}

fn default_tracking_id() -> String {
    "UA-143144958-1".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            url: default_analytics_url(),
            tracking_id: default_tracking_id(),
            enabled: default_enabled(),
        }
    }
}

// ---------------------------------------------------------------------------
// TelemetryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Directory holding `id`, `actions`, `active` and this config.
    /// Supplied at load time, never serialized.
    #[serde(skip)]
    pub state_dir: PathBuf,
    /// Prefix of sibling installation directories (`<identifier>-<version>`).
    #[serde(default = "default_identifier")]
    pub identifier: String,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_identifier() -> String {
    "vsnote.vscode-note".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl TelemetryConfig {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            identifier: default_identifier(),
            collector: CollectorConfig::default(),
            analytics: AnalyticsConfig::default(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Load `config.yaml` from `state_dir`, falling back to defaults when absent.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = paths::config_path(state_dir);
        let Some(data) = crate::io::read_optional(&path)? else {
            return Ok(Self::new(state_dir));
        };
        let mut cfg: TelemetryConfig = serde_yaml::from_str(&data)?;
        cfg.state_dir = state_dir.to_path_buf();
        Ok(cfg)
    }

    pub fn save(&self) -> Result<()> {
        let path = paths::config_path(&self.state_dir);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.identifier.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "identifier is empty; installed versions cannot be discovered"
                    .to_string(),
            });
        }

        if self.collector.enabled && self.collector.url.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "collector is enabled but collector.url is empty".to_string(),
            });
        }

        if self.analytics.enabled {
            if self.analytics.url.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "analytics is enabled but analytics.url is empty".to_string(),
                });
            }
            if self.analytics.tracking_id.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "analytics.tracking_id is empty".to_string(),
                });
            }
        }

        if self.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "timeout_secs=0 disables request timeouts".to_string(),
            });
        }

        warnings
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
    fn load_missing_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = TelemetryConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.state_dir, dir.path());
        assert_eq!(cfg.identifier, "vsnote.vscode-note");
        assert_eq!(cfg.timeout_secs, 10);
        assert!(cfg.collector.enabled);
    }

    #[test]
    fn config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut cfg = TelemetryConfig::new(dir.path());
        cfg.collector.url = "http://localhost:9999/hook".to_string();
        cfg.analytics.enabled = false;
        cfg.save().unwrap();

        let loaded = TelemetryConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.collector.url, "http://localhost:9999/hook");
        assert!(!loaded.analytics.enabled);
        assert_eq!(loaded.state_dir, dir.path());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "collector:\n  url: http://example.test/hook\n",
        )
        .unwrap();
        let cfg = TelemetryConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.collector.url, "http://example.test/hook");
        assert!(cfg.collector.enabled);
        assert_eq!(cfg.analytics, AnalyticsConfig::default());
    }

    #[test]
    fn validate_default_config_no_warnings() {
        let cfg = TelemetryConfig::new("/tmp/state");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_flags_empty_urls_and_zero_timeout() {
        let mut cfg = TelemetryConfig::new("/tmp/state");
        cfg.collector.url = String::new();
        cfg.analytics.url = " ".to_string();
        cfg.timeout_secs = 0;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("collector.url")));
        assert!(warnings.iter().any(|w| w.message.contains("analytics.url")));
        assert!(warnings.iter().any(|w| w.message.contains("timeout_secs")));
    }

    #[test]
    fn validate_ignores_disabled_endpoints() {
        let mut cfg = TelemetryConfig::new("/tmp/state");
        cfg.collector.enabled = false;
        cfg.collector.url = String::new();
        cfg.analytics.enabled = false;
        cfg.analytics.tracking_id = String::new();
        assert!(cfg.validate().is_empty());
    }
}
