pub mod general_help;
pub mod main_menu;
pub mod metrics;
pub mod resource_login;
pub mod security;
pub mod website_login;

use std::collections::HashMap;

use crate::external::http::dto::TicketSubmissionResult;
use crate::external::Services;
use crate::flow::rt::context::Context;
use crate::flow::rt::step::{resolve_flow, FlowStep, Next, RESERVED_IDS};
use crate::result::{Error, Result};

/// The merged, resolved flow table for the whole bot.
pub struct FlowTable {
    steps: HashMap<&'static str, FlowStep>,
}

impl FlowTable {
    pub fn get(&self, id: &str) -> Option<&FlowStep> {
        self.steps.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.steps.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FlowStep)> {
        self.steps.iter().map(|(id, step)| (*id, step))
    }
}

/// Merges every scenario into one table. Duplicate step ids and literal
/// `next` targets that name no merged step are build-time defects and fail
/// the merge.
pub fn build_flow_table() -> Result<FlowTable> {
    let mut steps: HashMap<&'static str, FlowStep> = HashMap::with_capacity(64);
    let flows = [
        main_menu::flow(),
        website_login::flow(),
        resource_login::flow(),
        general_help::flow(),
        security::flow(),
        metrics::flow(),
    ];
    for flow in flows {
        for (id, step) in resolve_flow(flow) {
            if steps.insert(id, step).is_some() {
                return Err(Error::ErrorWithMessage(format!(
                    "Duplicate step id in merged flow table: {}",
                    id
                )));
            }
        }
    }
    for (id, step) in steps.iter() {
        if let Next::Goto(target) = &step.next {
            if !steps.contains_key(target) && !RESERVED_IDS.contains(target) {
                return Err(Error::ErrorWithMessage(format!(
                    "Step {} routes to missing step {}",
                    id, target
                )));
            }
        }
    }
    Ok(FlowTable { steps })
}

/// Routes to the first contact field still missing after merging the form
/// with the identity snapshot, in the fixed order email, name, id.
pub(crate) fn next_missing_contact(
    ctx: &Context,
    email_step: &'static str,
    name_step: &'static str,
    id_step: &'static str,
    done_step: &'static str,
) -> String {
    if ctx.effective_email().is_none() {
        return String::from(email_step);
    }
    if ctx.effective_name().is_none() {
        return String::from(name_step);
    }
    if ctx.effective_access_id().is_none() {
        return String::from(id_step);
    }
    String::from(done_step)
}

/// JSM request field value: the string if present, else "".
pub(crate) fn field(v: Option<&str>) -> serde_json::Value {
    serde_json::Value::String(String::from(v.unwrap_or("")))
}

/// Stores a submission outcome on the session so the terminal success step
/// can render it, and emits the analytics event.
pub(crate) fn store_submission(
    ctx: &mut Context,
    services: &Services,
    result: TicketSubmissionResult,
    ticket_type: &str,
) {
    if result.success {
        ctx.form.ticket_key = result.ticket_key.clone();
        ctx.form.ticket_url = result.ticket_url.clone();
    } else {
        ctx.form.submission_error = result.error.clone();
    }
    services.track(
        "chatbot_ticket_submitted",
        &ctx.session_id,
        serde_json::json!({
            "ticketType": ticket_type,
            "success": result.success,
            "status": result.status,
        }),
    );
    ctx.submission = Some(result);
}
