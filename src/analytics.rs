use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// One analytics event emitted by the bot. Core Q&A events belong to the
/// chat engine; these cover menu navigation, ticket submission and metrics
/// feedback.
#[derive(Clone, Debug, Serialize)]
pub struct TrackEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    pub timestamp: u64,
    pub detail: serde_json::Value,
}

impl TrackEvent {
    pub fn new(event_type: &str, session_id: &str, detail: serde_json::Value) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            event_type: String::from(event_type),
            session_id: Some(String::from(session_id)),
            timestamp,
            detail,
        }
    }
}

pub type AnalyticsCallback = Box<dyn Fn(TrackEvent) + Send + Sync>;
