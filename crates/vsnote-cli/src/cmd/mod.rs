pub mod action;
pub mod config;
pub mod heartbeat;
pub mod init;
pub mod status;
pub mod upgrade;

use anyhow::Context;
use std::path::Path;
use vsnote_core::config::TelemetryConfig;
use vsnote_core::Client;

/// Version of the vsnote binary embedded at compile time.
pub const VSNOTE_BINARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a client for `state_dir` reporting `version` (default: the binary's version).
pub fn load_client(state_dir: &Path, version: Option<&str>) -> anyhow::Result<Client> {
    let config = TelemetryConfig::load(state_dir).context("failed to load config.yaml")?;
    Client::from_config(config, version.unwrap_or(VSNOTE_BINARY_VERSION))
        .context("failed to build HTTP transport")
}
