use std::default::Default;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::result::{Error, Result};

const ENV_PREFIX: &str = "SUPPORTBOT_";

#[derive(Clone, Deserialize, Serialize)]
pub struct Settings {
    pub ip: String,
    pub port: u16,
    #[serde(rename = "maxSessionIdleMin")]
    pub max_session_idle_min: u16,
    #[serde(rename = "qaEndpoint")]
    pub qa_endpoint: String,
    #[serde(rename = "ratingEndpoint")]
    pub rating_endpoint: String,
    #[serde(rename = "metricsExamplesUrl")]
    pub metrics_examples_url: String,
    #[serde(rename = "proxyBaseUrl")]
    pub proxy_base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    #[serde(rename = "botName")]
    pub bot_name: String,
    pub logo: String,
    #[serde(rename = "welcomeMessage")]
    pub welcome_message: String,
    #[serde(rename = "welcomeMessageLoggedOut")]
    pub welcome_message_logged_out: String,
    #[serde(rename = "loginUrl")]
    pub login_url: String,
    pub tooltip: String,
    #[serde(rename = "maxAttachmentMb")]
    pub max_attachment_mb: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ip: String::from("127.0.0.1"),
            port: 12790,
            max_session_idle_min: 30,
            qa_endpoint: String::from(
                "https://access-ai-grace1-external.ccs.uky.edu/access/chat/api/",
            ),
            rating_endpoint: String::from(
                "https://access-ai-grace1-external.ccs.uky.edu/access/chat/rating/",
            ),
            metrics_examples_url: String::from("https://metrics.access-ci.org/"),
            proxy_base_url: String::from("https://access-jsm-api.netlify.app"),
            api_key: String::from("demo-key"),
            bot_name: String::from("ACCESS Q&A"),
            logo: String::from(
                "https://support.access-ci.org/themes/contrib/asp-theme/images/icons/ACCESS-arrrow.svg",
            ),
            welcome_message: String::from("Hello! What can I help you with?"),
            welcome_message_logged_out: String::from("To ask questions, please log in."),
            login_url: String::from("/login"),
            tooltip: String::from("Ask me about ACCESS! \u{1f60a}"),
            max_attachment_mb: 10,
        }
    }
}

fn env_override(target: &mut String, key: &str) {
    if let Ok(v) = std::env::var(format!("{}{}", ENV_PREFIX, key)) {
        if !v.is_empty() {
            *target = v;
        }
    }
}

impl Settings {
    /// Builds settings from defaults, then applies any `SUPPORTBOT_*`
    /// environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut s = Settings::default();
        env_override(&mut s.ip, "IP");
        if let Ok(v) = std::env::var(format!("{}PORT", ENV_PREFIX)) {
            s.port = v.parse().map_err(|_| {
                Error::ErrorWithMessage(format!("Invalid {}PORT value: {}", ENV_PREFIX, v))
            })?;
        }
        env_override(&mut s.qa_endpoint, "QA_ENDPOINT");
        env_override(&mut s.rating_endpoint, "RATING_ENDPOINT");
        env_override(&mut s.metrics_examples_url, "METRICS_EXAMPLES_URL");
        env_override(&mut s.proxy_base_url, "PROXY_BASE_URL");
        env_override(&mut s.api_key, "API_KEY");
        env_override(&mut s.login_url, "LOGIN_URL");
        env_override(&mut s.welcome_message, "WELCOME_MESSAGE");
        s.validate_addr()?;
        Ok(s)
    }

    pub fn validate_addr(&self) -> Result<()> {
        let addr = format!("{}:{}", self.ip, self.port);
        let _: SocketAddr = addr.parse().map_err(|_| {
            log::error!("Invalid listen address: {}", &addr);
            Error::ErrorWithMessage(format!("Invalid listen address: {}", addr))
        })?;
        Ok(())
    }

    pub fn max_attachment_bytes(&self) -> usize {
        self.max_attachment_mb as usize * 1024 * 1024
    }
}
