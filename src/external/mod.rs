pub mod attachment;
pub mod http;

use crate::analytics::{AnalyticsCallback, TrackEvent};
use crate::man::settings::Settings;

/// External collaborators shared by every step invocation: configuration,
/// the outbound HTTP client and the optional analytics sink.
pub struct Services {
    pub settings: Settings,
    pub http: reqwest::Client,
    pub analytics: Option<AnalyticsCallback>,
}

impl Services {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
            analytics: None,
        }
    }

    pub fn with_analytics(mut self, callback: AnalyticsCallback) -> Self {
        self.analytics = Some(callback);
        self
    }

    pub fn track(&self, event_type: &str, session_id: &str, detail: serde_json::Value) {
        if let Some(cb) = &self.analytics {
            cb(TrackEvent::new(event_type, session_id, detail));
        }
    }
}
