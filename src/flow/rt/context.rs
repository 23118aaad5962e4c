use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::time::{interval, Duration};

use crate::external::attachment::UploadedFile;
use crate::external::http::dto::TicketSubmissionResult;

/// Read-only identity snapshot supplied by the caller once per session.
/// Only ever used as a fallback for fields the form leaves empty.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UserInfo {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "accessId")]
    pub access_id: Option<String>,
}

/// Accumulator for everything a scenario collects. Superset of the fields
/// across all ticket types; reset whenever a top-level scenario is entered
/// from the main menu.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TicketForm {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "accessId")]
    pub access_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "ticketType")]
    pub ticket_type: Option<String>,
    #[serde(rename = "identityProvider")]
    pub identity_provider: Option<String>,
    pub browser: Option<String>,
    #[serde(rename = "resourceName")]
    pub resource_name: Option<String>,
    #[serde(rename = "userIdAtResource")]
    pub user_id_at_resource: Option<String>,
    #[serde(rename = "involvesResource")]
    pub involves_resource: Option<String>,
    pub keywords: Option<String>,
    #[serde(rename = "suggestedKeyword")]
    pub suggested_keyword: Option<String>,
    #[serde(rename = "wantsAttachment")]
    pub wants_attachment: Option<String>,
    #[serde(rename = "uploadConfirmed")]
    pub upload_confirmed: bool,
    #[serde(rename = "uploadedFiles")]
    pub uploaded_files: Vec<UploadedFile>,
    #[serde(rename = "ticketKey")]
    pub ticket_key: Option<String>,
    #[serde(rename = "ticketUrl")]
    pub ticket_url: Option<String>,
    #[serde(rename = "submissionError")]
    pub submission_error: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    match v.as_deref() {
        Some(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// Display fallback used by summary messages.
pub fn or_not_provided(v: Option<&str>) -> &str {
    match v {
        Some(s) if !s.is_empty() => s,
        _ => "Not provided",
    }
}

/// Per-session conversation state. Every step invocation receives this by
/// reference; scenario scratch values (submission outcome, feedback query
/// id) are fields here, never closure captures.
#[derive(Clone, Debug)]
pub struct Context {
    pub session_id: String,
    pub current_step: Option<String>,
    pub prev_step: Option<String>,
    pub form: TicketForm,
    pub user: UserInfo,
    pub submission: Option<TicketSubmissionResult>,
    pub feedback_query_id: Option<String>,
    last_activity: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Context {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: String::from(session_id),
            current_step: None,
            prev_step: None,
            form: TicketForm::default(),
            user: UserInfo::default(),
            submission: None,
            feedback_query_id: None,
            last_activity: now_secs(),
        }
    }

    /// Fresh form for a new scenario; the identity snapshot survives.
    pub fn reset_form(&mut self) {
        self.form = TicketForm::default();
        self.submission = None;
    }

    pub fn touch(&mut self) {
        self.last_activity = now_secs();
    }

    /// Form value first, identity snapshot as fallback; an empty or
    /// whitespace-only form value counts as missing.
    pub fn effective_email(&self) -> Option<&str> {
        non_empty(&self.form.email).or_else(|| non_empty(&self.user.email))
    }

    pub fn effective_name(&self) -> Option<&str> {
        non_empty(&self.form.name).or_else(|| non_empty(&self.user.name))
    }

    pub fn effective_access_id(&self) -> Option<&str> {
        non_empty(&self.form.access_id).or_else(|| non_empty(&self.user.access_id))
    }

    pub fn has_full_contact(&self) -> bool {
        self.effective_email().is_some()
            && self.effective_name().is_some()
            && self.effective_access_id().is_some()
    }

    /// Attachment line appended to summary messages.
    pub fn file_info(&self) -> String {
        if self.form.uploaded_files.is_empty() {
            String::new()
        } else {
            format!(
                "\nAttachments: {} file(s) attached",
                self.form.uploaded_files.len()
            )
        }
    }

    fn idle_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_activity)
    }
}

/// Holds one [`Context`] per active session. Contexts are taken out for the
/// duration of a turn and put back afterwards, so no two turns of the same
/// session ever run concurrently.
pub struct SessionStore {
    sessions: tokio::sync::Mutex<HashMap<String, Context>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: tokio::sync::Mutex::new(HashMap::with_capacity(16)),
        }
    }

    pub async fn take(&self, session_id: &str) -> Context {
        let mut sessions = self.sessions.lock().await;
        sessions
            .remove(session_id)
            .unwrap_or_else(|| Context::new(session_id))
    }

    pub async fn put(&self, mut ctx: Context) {
        ctx.touch();
        let mut sessions = self.sessions.lock().await;
        sessions.insert(ctx.session_id.clone(), ctx);
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn sweep_expired(&self, max_idle_secs: u64) {
        let now = now_secs();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, ctx| ctx.idle_secs(now) <= max_idle_secs);
        let removed = before - sessions.len();
        if removed > 0 {
            log::info!("Removed {} expired session(s)", removed);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn clean_expired_sessions(
    store: Arc<SessionStore>,
    mut recv: tokio::sync::oneshot::Receiver<()>,
    max_idle_min: u16,
) {
    let max_idle_secs = (max_idle_min as u64) * 60;
    let mut interval = interval(Duration::from_secs(max_idle_secs.max(60)));
    loop {
        tokio::select! {
          _ = interval.tick() => {
          }
          _ = &mut recv => {
            break;
          }
        }
        log::info!("Cleaning expired sessions");
        store.sweep_expired(max_idle_secs).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_is_only_a_fallback() {
        let mut ctx = Context::new("s1");
        ctx.user.email = Some(String::from("fallback@example.edu"));
        assert_eq!(ctx.effective_email(), Some("fallback@example.edu"));
        ctx.form.email = Some(String::from("typed@example.edu"));
        assert_eq!(ctx.effective_email(), Some("typed@example.edu"));
    }

    #[test]
    fn blank_form_value_counts_as_missing() {
        let mut ctx = Context::new("s1");
        ctx.form.access_id = Some(String::new());
        assert_eq!(ctx.effective_access_id(), None);
        assert_eq!(or_not_provided(ctx.effective_access_id()), "Not provided");
    }

    #[test]
    fn reset_keeps_identity_but_clears_fields() {
        let mut ctx = Context::new("s1");
        ctx.user.name = Some(String::from("Ada"));
        ctx.form.description = Some(String::from("broken"));
        ctx.submission = Some(crate::external::http::dto::TicketSubmissionResult::created(
            None, None,
        ));
        ctx.reset_form();
        assert!(ctx.form.description.is_none());
        assert!(ctx.submission.is_none());
        assert_eq!(ctx.effective_name(), Some("Ada"));
    }

    #[tokio::test]
    async fn store_hands_back_the_same_session() {
        let store = SessionStore::new();
        let mut ctx = store.take("abc").await;
        ctx.form.summary = Some(String::from("hello"));
        store.put(ctx).await;
        let ctx = store.take("abc").await;
        assert_eq!(ctx.form.summary.as_deref(), Some("hello"));
        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn sweep_drops_idle_sessions() {
        let store = SessionStore::new();
        let mut ctx = Context::new("old");
        ctx.last_activity = 0;
        store.put_without_touch(ctx).await;
        store.put(Context::new("fresh")).await;
        store.sweep_expired(60).await;
        assert_eq!(store.active_sessions().await, 1);
    }
}

#[cfg(test)]
impl SessionStore {
    async fn put_without_touch(&self, ctx: Context) {
        self.sessions.lock().await.insert(ctx.session_id.clone(), ctx);
    }
}
