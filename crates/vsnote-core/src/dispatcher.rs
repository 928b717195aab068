use crate::actions::{ActionLog, Actions, INSTALLED};
use crate::error::Result;
use crate::identity;
use crate::transport::{ActionEvent, ClientInfoEvent, Event, OsInfo, Transport};
use serde::Serialize;
use std::path::Path;

/// Result of one flush attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlushOutcome {
    /// Nothing was pending.
    Empty,
    /// Every pending event was accepted; the log is cleared.
    Delivered { events: usize },
    /// A delivery failed; the full original map was written back.
    Restaged {
        delivered_before_failure: usize,
        pending: usize,
        error: String,
    },
}

impl FlushOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, FlushOutcome::Delivered { .. } | FlushOutcome::Empty)
    }
}

/// Drains the [`ActionLog`] through a [`Transport`].
pub struct ActionDispatcher<'a> {
    state_dir: &'a Path,
    log: &'a ActionLog,
    transport: &'a dyn Transport,
    version: &'a str,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(
        state_dir: &'a Path,
        log: &'a ActionLog,
        transport: &'a dyn Transport,
        version: &'a str,
    ) -> Self {
        Self {
            state_dir,
            log,
            transport,
            version,
        }
    }

    /// Deliver every pending event, sequentially, stopping at the first failure.
    ///
    /// On failure the unmodified pending map is restaged so the next flush
    /// retries it verbatim. Never returns an error.
    pub fn flush(&self) -> FlushOutcome {
        let actions = self.log.load_or_empty();
        self.flush_actions(actions)
    }

    /// Like [`flush`](Self::flush), but starting from an already-loaded map.
    pub fn flush_actions(&self, actions: Actions) -> FlushOutcome {
        let pending: usize = actions.values().map(Vec::len).sum();
        if actions.is_empty() {
            if let Err(e) = self.log.clear() {
                tracing::warn!(error = %e, "failed to clear empty action log");
            }
            return FlushOutcome::Empty;
        }

        let mut delivered = 0;
        if let Err(e) = self.deliver_all(&actions, &mut delivered) {
            tracing::warn!(
                error = %e,
                delivered,
                pending,
                "action flush failed; restaging pending actions"
            );
            if let Err(stage_err) = self.log.stage(&actions) {
                tracing::error!(error = %stage_err, "failed to restage pending actions");
            }
            return FlushOutcome::Restaged {
                delivered_before_failure: delivered,
                pending,
                error: e.to_string(),
            };
        }

        if let Err(e) = self.log.clear() {
            // Everything was delivered; a stale file means duplicates on the next flush.
            tracing::warn!(error = %e, "failed to clear delivered action log");
        }
        tracing::info!(events = delivered, "flushed pending actions");
        FlushOutcome::Delivered { events: delivered }
    }

    fn deliver_all(&self, actions: &Actions, delivered: &mut usize) -> Result<()> {
        let cid = identity::get_id(self.state_dir)?;
        for event in self.events(&cid, actions) {
            self.transport.deliver(&event)?;
            *delivered += 1;
        }
        Ok(())
    }

    /// Expand the pending map into the events a flush sends, in send order.
    pub fn events(&self, cid: &str, actions: &Actions) -> Vec<Event> {
        let mut events = Vec::new();
        for (action, timestamps) in actions {
            if action == INSTALLED {
                if let Some(&first) = timestamps.first() {
                    events.push(Event::ClientInfo(ClientInfoEvent {
                        cid: cid.to_string(),
                        info: OsInfo::current(),
                        timestamp: first,
                        version: self.version.to_string(),
                    }));
                }
                continue;
            }
            for &timestamp in timestamps {
                events.push(Event::Action(ActionEvent {
                    cid: cid.to_string(),
                    action: action.clone(),
                    timestamp,
                    version: self.version.to_string(),
                }));
            }
        }
        events
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
