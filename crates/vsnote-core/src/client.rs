//! Startup orchestration and the per-session action recorder.
//!
//! ```text
//! Client::init
//!   ├─ no id yet?  create state dir, generate id, stage `installed`
//!   ├─ run_upgrade (previous, current]
//!   ├─ ensure_id
//!   └─ Heartbeat::maybe_send_active
//! Client::record(action)
//!   └─ ActionLog::record → ActionDispatcher::flush_actions
//! ```

use crate::actions::{ActionLog, Actions, INSTALLED};
use crate::clock::{Clock, SystemClock};
use crate::config::TelemetryConfig;
use crate::dispatcher::{ActionDispatcher, FlushOutcome};
use crate::error::Result;
use crate::heartbeat::{self, Heartbeat, HeartbeatOutcome};
use crate::migrations::{self, MigrationContext, MigrationStep, UpgradePlan, UpgradeReport};
use crate::transport::{HttpTransport, Transport};
use crate::{identity, io, paths};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitReport {
    pub first_run: bool,
    /// `None` when the upgrade check could not run (e.g. unparseable version).
    pub upgrade: Option<UpgradeReport>,
    pub heartbeat: HeartbeatOutcome,
}

/// Snapshot of the persisted client state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStatus {
    pub client_id: Option<String>,
    pub pending: Actions,
    pub last_active: Option<DateTime<Utc>>,
}

pub struct Client {
    config: TelemetryConfig,
    version: String,
    log: ActionLog,
    clock: Box<dyn Clock>,
    transport: Box<dyn Transport>,
}

impl Client {
    pub fn new(
        config: TelemetryConfig,
        version: impl Into<String>,
        clock: Box<dyn Clock>,
        transport: Box<dyn Transport>,
    ) -> Self {
        let log = ActionLog::new(&config.state_dir);
        Self {
            config,
            version: version.into(),
            log,
            clock,
            transport,
        }
    }

    /// A client using the system clock and the HTTP transport described by `config`.
    pub fn from_config(config: TelemetryConfig, version: impl Into<String>) -> Result<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::new(
            config,
            version,
            Box::new(SystemClock),
            Box::new(transport),
        ))
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn state_dir(&self) -> &Path {
        &self.config.state_dir
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.log
    }

    /// Run the startup sequence.
    ///
    /// Only failing to set up the state directory or client id is an error;
    /// upgrade and heartbeat problems are reported in the returned [`InitReport`].
    pub fn init(&self, installs_dir: &Path, steps: &[MigrationStep]) -> Result<InitReport> {
        let first_run = self.is_first_run();
        if first_run {
            io::ensure_dir(self.state_dir())?;
            identity::ensure_id(self.state_dir())?;
            let mut installed = Actions::new();
            installed.insert(INSTALLED.to_string(), vec![self.clock.now_millis()]);
            self.log.stage(&installed)?;
            tracing::info!(state_dir = %self.state_dir().display(), "initialized client state");
        }

        let upgrade = match self.upgrade(installs_dir, steps) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(error = %e, "skipping version upgrade");
                None
            }
        };

        // Upgrade steps may have restored a legacy id; only generate one if still missing.
        identity::ensure_id(self.state_dir())?;

        let heartbeat = self.heartbeat();
        Ok(InitReport {
            first_run,
            upgrade,
            heartbeat,
        })
    }

    /// No client id has ever been written, under either file name.
    pub fn is_first_run(&self) -> bool {
        !paths::id_path(self.state_dir()).exists()
            && !paths::legacy_id_path(self.state_dir()).exists()
    }

    pub fn upgrade(&self, installs_dir: &Path, steps: &[MigrationStep]) -> Result<UpgradeReport> {
        let ctx = MigrationContext {
            state_dir: self.state_dir(),
        };
        migrations::run_upgrade(
            &ctx,
            steps,
            installs_dir,
            &self.config.identifier,
            &self.version,
        )
    }

    /// The steps [`upgrade`](Self::upgrade) would run, without running them.
    pub fn plan_upgrade<'s>(
        &self,
        installs_dir: &Path,
        steps: &'s [MigrationStep],
    ) -> Result<UpgradePlan<'s>> {
        migrations::plan_upgrade(steps, installs_dir, &self.config.identifier, &self.version)
    }

    pub fn heartbeat(&self) -> HeartbeatOutcome {
        Heartbeat::new(
            self.state_dir(),
            &self.log,
            self.transport.as_ref(),
            self.clock.as_ref(),
            &self.version,
        )
        .maybe_send_active()
    }

    /// Record one occurrence of `action` and immediately try to flush.
    pub fn record(&self, action: &str) -> FlushOutcome {
        match self.log.record(action, self.clock.now_millis()) {
            Ok(actions) => self.dispatcher().flush_actions(actions),
            Err(e) => {
                // The action could not be persisted; still try to drain what is queued.
                tracing::warn!(action, error = %e, "failed to record action");
                self.flush()
            }
        }
    }

    pub fn flush(&self) -> FlushOutcome {
        self.dispatcher().flush()
    }

    pub fn status(&self) -> ClientStatus {
        ClientStatus {
            client_id: identity::get_id(self.state_dir()).ok(),
            pending: self.log.load_or_empty(),
            last_active: heartbeat::read_marker(self.state_dir()).ok().flatten(),
        }
    }

    fn dispatcher(&self) -> ActionDispatcher<'_> {
        ActionDispatcher::new(
            self.state_dir(),
            &self.log,
            self.transport.as_ref(),
            &self.version,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
