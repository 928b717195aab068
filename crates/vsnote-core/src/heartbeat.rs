//! Daily "active" heartbeat.
//!
//! The `active` marker holds the Unix-ms time of the last heartbeat. The next
//! heartbeat is due once `marker + 24h`, truncated to local midnight, has
//! passed. That yields at most one `active` event per calendar day.

use crate::actions::{ActionLog, ACTIVE};
use crate::clock::Clock;
use crate::dispatcher::{ActionDispatcher, FlushOutcome};
use crate::error::{Result, TelemetryError};
use crate::transport::Transport;
use crate::{identity, io, paths};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HeartbeatOutcome {
    /// Already sent for the current window.
    Skipped { next_boundary: DateTime<Utc> },
    /// An `active` action was recorded and the marker advanced.
    Sent { flush: FlushOutcome },
    /// Something failed; the marker was removed so the next run resends.
    Failed { error: String },
}

/// Local midnight starting the day that contains `marker + 24h`.
///
/// Falls back to `marker + 24h` itself when that local midnight does not exist.
/// `None` when `marker + 24h` is outside the representable range.
pub fn next_boundary<Tz: TimeZone>(marker: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let shifted = marker.clone().checked_add_signed(Duration::hours(24))?;
    let midnight = shifted.date_naive().and_hms_opt(0, 0, 0)?;
    let boundary = shifted.timezone().from_local_datetime(&midnight).earliest();
    Some(boundary.unwrap_or(shifted))
}

/// Read the `active` marker. `Ok(None)` when there is no marker yet.
pub fn read_marker(state_dir: &Path) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = io::read_optional(&paths::active_path(state_dir))? else {
        return Ok(None);
    };
    let millis: i64 = raw
        .trim()
        .parse()
        .map_err(|_| TelemetryError::InvalidMarker(raw.trim().to_string()))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(Some)
        .ok_or_else(|| TelemetryError::InvalidMarker(millis.to_string()))
}

pub struct Heartbeat<'a> {
    state_dir: &'a Path,
    log: &'a ActionLog,
    transport: &'a dyn Transport,
    clock: &'a dyn Clock,
    version: &'a str,
}

impl<'a> Heartbeat<'a> {
    pub fn new(
        state_dir: &'a Path,
        log: &'a ActionLog,
        transport: &'a dyn Transport,
        clock: &'a dyn Clock,
        version: &'a str,
    ) -> Self {
        Self {
            state_dir,
            log,
            transport,
            clock,
            version,
        }
    }

    /// Record and flush an `active` action if the current window has not had one.
    ///
    /// Never returns an error; failures remove the marker and are reported in
    /// the outcome.
    pub fn maybe_send_active(&self) -> HeartbeatOutcome {
        match self.try_send_active() {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "heartbeat failed; clearing active marker");
                if let Err(rm) = io::remove_if_exists(&paths::active_path(self.state_dir)) {
                    tracing::error!(error = %rm, "failed to remove active marker");
                }
                HeartbeatOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    fn try_send_active(&self) -> Result<HeartbeatOutcome> {
        let now = self.clock.now();
        let marker = read_marker(self.state_dir)?;

        if let Some(marker) = marker {
            let boundary = next_boundary(&marker.with_timezone(&Local))
                .ok_or_else(|| {
                    TelemetryError::InvalidMarker(marker.timestamp_millis().to_string())
                })?
                .with_timezone(&Utc);
            if boundary >= now {
                tracing::debug!(next = %boundary, "heartbeat already sent for this window");
                return Ok(HeartbeatOutcome::Skipped {
                    next_boundary: boundary,
                });
            }
        }

        let now_ms = now.timestamp_millis();
        let actions = self.log.record(ACTIVE, now_ms)?;
        let flush = ActionDispatcher::new(self.state_dir, self.log, self.transport, self.version)
            .flush_actions(actions);

        // Analytics is best-effort; its failure does not reopen the window.
        match identity::get_id(self.state_dir) {
            Ok(uid) => {
                if let Err(e) = self.transport.ping(&uid, ACTIVE, self.version) {
                    tracing::warn!(error = %e, "analytics ping failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping analytics ping"),
        }

        io::atomic_write(
            &paths::active_path(self.state_dir),
            now_ms.to_string().as_bytes(),
        )?;
        tracing::info!("recorded daily active heartbeat");
        Ok(HeartbeatOutcome::Sent { flush })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
