//! Outbound delivery of telemetry events.
//!
//! The primary collector receives each event as a JSON message whose `text`
//! field is itself the JSON-encoded event. The secondary analytics endpoint
//! receives a form-encoded event hit. Both are plain POSTs; any non-2xx
//! response counts as a failed delivery.

use crate::config::TelemetryConfig;
use crate::error::{Result, TelemetryError};
use serde::Serialize;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// One occurrence of a named action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionEvent {
    pub cid: String,
    pub action: String,
    pub timestamp: i64,
    pub version: String,
}

/// Installation environment descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsInfo {
    #[serde(rename = "type")]
    pub os_type: String,
    pub platform: String,
    pub release: String,
    pub hostname: String,
    pub arch: String,
}

impl OsInfo {
    pub fn current() -> Self {
        let info = os_info::get();
        Self {
            os_type: info.os_type().to_string(),
            platform: std::env::consts::OS.to_string(),
            release: info.version().to_string(),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_default(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Sent once per installation in place of the bare `installed` action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientInfoEvent {
    pub cid: String,
    pub info: OsInfo,
    pub timestamp: i64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Event {
    Action(ActionEvent),
    ClientInfo(ClientInfoEvent),
}

impl Event {
    pub fn timestamp(&self) -> i64 {
        match self {
            Event::Action(e) => e.timestamp,
            Event::ClientInfo(e) => e.timestamp,
        }
    }
}

/// Wrap an event the way the collector expects: `{"text": "<event json>"}`.
pub fn collector_body(event: &Event) -> Result<serde_json::Value> {
    Ok(serde_json::json!({ "text": serde_json::to_string(event)? }))
}

/// Analytics event hit, sent as `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsHit<'a> {
    pub v: u8,
    pub tid: &'a str,
    pub uid: &'a str,
    pub t: &'a str,
    pub ec: &'a str,
    pub ea: &'a str,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

pub trait Transport {
    /// Deliver one event to the primary collector.
    fn deliver(&self, event: &Event) -> Result<()>;

    /// Send an event hit (`category`, `action`) for client `uid` to the analytics endpoint.
    fn ping(&self, uid: &str, category: &str, action: &str) -> Result<()>;
}

/// Blocking HTTP transport. A disabled endpoint accepts and drops everything.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    collector_url: Option<String>,
    analytics_url: Option<String>,
    tracking_id: String,
}

impl HttpTransport {
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("vsnote/", env!("CARGO_PKG_VERSION")));
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            client: builder.build()?,
            collector_url: config
                .collector
                .enabled
                .then(|| config.collector.url.clone()),
            analytics_url: config
                .analytics
                .enabled
                .then(|| config.analytics.url.clone()),
            tracking_id: config.analytics.tracking_id.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn deliver(&self, event: &Event) -> Result<()> {
        let Some(url) = &self.collector_url else {
            tracing::debug!("collector disabled; dropping event");
            return Ok(());
        };
        let resp = self.client.post(url).json(&collector_body(event)?).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TelemetryError::Delivery(format!(
                "collector returned {status}"
            )));
        }
        Ok(())
    }

    fn ping(&self, uid: &str, category: &str, action: &str) -> Result<()> {
        let Some(url) = &self.analytics_url else {
            return Ok(());
        };
        let hit = AnalyticsHit {
            v: 1,
            tid: &self.tracking_id,
            uid,
            t: "event",
            ec: category,
            ea: action,
        };
        let resp = self.client.post(url).form(&hit).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TelemetryError::Delivery(format!(
                "analytics returned {status}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn action_event() -> Event {
        Event::Action(ActionEvent {
            cid: "abc123".into(),
            action: "open-note".into(),
            timestamp: 42,
            version: "0.3.0".into(),
        })
    }

    fn config_for(server: &mockito::Server) -> TelemetryConfig {
        let mut cfg = TelemetryConfig::new("/tmp/unused");
        cfg.collector.url = format!("{}/hook", server.url());
        cfg.analytics.url = format!("{}/collect", server.url());
        cfg.analytics.tracking_id = "UA-1".into();
        cfg
    }

    #[test]
    fn action_event_serializes_flat() {
        let json = serde_json::to_value(action_event()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"cid": "abc123", "action": "open-note", "timestamp": 42, "version": "0.3.0"})
        );
    }

    #[test]
    fn client_info_renames_type_field() {
        let event = Event::ClientInfo(ClientInfoEvent {
            cid: "abc".into(),
            info: OsInfo {
                os_type: "Linux".into(),
                platform: "linux".into(),
                release: "6.1".into(),
                hostname: "box".into(),
                arch: "x86_64".into(),
            },
            timestamp: 7,
            version: "0.3.0".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["info"]["type"], "Linux");
        assert!(json["info"].get("os_type").is_none());
        assert_eq!(event.timestamp(), 7);
    }

    #[test]
    fn collector_body_wraps_event_as_string() {
        let body = collector_body(&action_event()).unwrap();
        let text = body["text"].as_str().unwrap();
        let inner: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(inner["action"], "open-note");
    }

    #[test]
    fn http_deliver_posts_wrapped_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/hook")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "text": serde_json::to_string(&action_event()).unwrap()
            })))
            .with_status(200)
            .create();

        let transport = HttpTransport::from_config(&config_for(&server)).unwrap();
        transport.deliver(&action_event()).unwrap();
        mock.assert();
    }

    #[test]
    fn http_deliver_non_success_is_error() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("POST", "/hook").with_status(500).create();

        let transport = HttpTransport::from_config(&config_for(&server)).unwrap();
        let err = transport.deliver(&action_event()).unwrap_err();
        assert!(matches!(err, TelemetryError::Delivery(_)));
    }

    #[test]
    fn http_ping_sends_form_hit() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/collect")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("v".into(), "1".into()),
                Matcher::UrlEncoded("tid".into(), "UA-1".into()),
                Matcher::UrlEncoded("uid".into(), "abc123".into()),
                Matcher::UrlEncoded("t".into(), "event".into()),
                Matcher::UrlEncoded("ec".into(), "active".into()),
                Matcher::UrlEncoded("ea".into(), "0.3.0".into()),
            ]))
            .with_status(200)
            .create();

        let transport = HttpTransport::from_config(&config_for(&server)).unwrap();
        transport.ping("abc123", "active", "0.3.0").unwrap();
        mock.assert();
    }

    #[test]
    fn disabled_endpoints_drop_silently() {
        let mut cfg = TelemetryConfig::new("/tmp/unused");
        cfg.collector.enabled = false;
        cfg.analytics.enabled = false;
        let transport = HttpTransport::from_config(&cfg).unwrap();
        transport.deliver(&action_event()).unwrap();
        transport.ping("abc", "active", "0.3.0").unwrap();
    }
}
