use futures::future::BoxFuture;

use super::{field, store_submission};
use crate::external::http::client::{submit_ticket, TicketType};
use crate::external::http::dto::TicketSubmissionResult;
use crate::external::Services;
use crate::flow::rt::context::{or_not_provided, Context};
use crate::flow::rt::step::{ChatState, Flow, FlowStep, Role, START};
use crate::flow::validation::{process_optional_input, validate_email, validate_optional};

const SUBMIT: &str = "Submit Security Report";
const CONTACT_OK: &str = "Yes, that's correct";
const CONTACT_EDIT: &str = "Let me update it";

fn set_summary(chat: &ChatState, ctx: &mut Context) {
    ctx.form.summary = Some(chat.user_input.clone());
}

fn set_priority(chat: &ChatState, ctx: &mut Context) {
    ctx.form.priority = Some(chat.user_input.to_lowercase());
}

fn set_description(chat: &ChatState, ctx: &mut Context) {
    ctx.form.description = Some(chat.user_input.clone());
}

fn set_wants_attachment(chat: &ChatState, ctx: &mut Context) {
    ctx.form.wants_attachment = Some(chat.user_input.clone());
}

fn route_attachment(chat: &ChatState, _ctx: &Context) -> String {
    if chat.user_input == "Yes" {
        String::from("security_upload")
    } else {
        String::from("security_contact_check")
    }
}

fn confirm_upload(_chat: &ChatState, ctx: &mut Context) {
    ctx.form.upload_confirmed = true;
}

/// With full contact details on file this step confirms them; otherwise it
/// announces the collection detour that follows.
fn contact_check_message(_chat: &ChatState, ctx: &Context, _services: &Services) -> String {
    if ctx.has_full_contact() {
        return format!(
            "I have your contact information:\n\nName: {}\nEmail: {}\nACCESS ID: {}\n\nIs this correct?",
            or_not_provided(ctx.effective_name()),
            or_not_provided(ctx.effective_email()),
            or_not_provided(ctx.effective_access_id())
        );
    }
    String::from("I need your contact information.")
}

fn contact_check_options(_chat: &ChatState, ctx: &Context) -> Vec<String> {
    if ctx.has_full_contact() {
        vec![String::from(CONTACT_OK), String::from(CONTACT_EDIT)]
    } else {
        Vec::new()
    }
}

fn route_contact_check(chat: &ChatState, _ctx: &Context) -> String {
    String::from(match chat.user_input.as_str() {
        CONTACT_OK => "security_summary",
        CONTACT_EDIT => "security_name",
        _ => "security_email",
    })
}

fn set_email(chat: &ChatState, ctx: &mut Context) {
    ctx.form.email = Some(chat.user_input.clone());
}

fn route_after_email(_chat: &ChatState, ctx: &Context) -> String {
    if ctx.effective_name().is_none() {
        return String::from("security_name");
    }
    if ctx.effective_access_id().is_none() {
        return String::from("security_accessid");
    }
    String::from("security_summary")
}

fn set_name(chat: &ChatState, ctx: &mut Context) {
    ctx.form.name = Some(chat.user_input.clone());
}

fn route_after_name(_chat: &ChatState, ctx: &Context) -> String {
    if ctx.effective_email().is_none() {
        return String::from("security_email");
    }
    if ctx.effective_access_id().is_none() {
        return String::from("security_accessid");
    }
    String::from("security_summary")
}

fn set_access_id(chat: &ChatState, ctx: &mut Context) {
    ctx.form.access_id = Some(process_optional_input(&chat.user_input));
}

fn summary_message(_chat: &ChatState, ctx: &Context, _services: &Services) -> String {
    format!(
        "Here's a summary of your security incident report:\n\n\
         Summary: {}\n\
         Priority: {}\n\
         Name: {}\n\
         Email: {}\n\
         ACCESS ID: {}\n\
         Description: {}{}\n\n\
         Would you like to submit this security incident report?",
        or_not_provided(ctx.form.summary.as_deref()),
        or_not_provided(ctx.form.priority.as_deref()),
        or_not_provided(ctx.effective_name()),
        or_not_provided(ctx.effective_email()),
        or_not_provided(ctx.effective_access_id()),
        or_not_provided(ctx.form.description.as_deref()),
        ctx.file_info()
    )
}

fn submit<'a>(
    chat: &'a ChatState,
    ctx: &'a mut Context,
    services: &'a Services,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        if chat.user_input != SUBMIT {
            return;
        }
        let mut fields = serde_json::Map::new();
        fields.insert(String::from("summary"), field(ctx.form.summary.as_deref()));
        fields.insert(String::from("priority"), field(ctx.form.priority.as_deref()));
        fields.insert(
            String::from("description"),
            field(ctx.form.description.as_deref()),
        );
        fields.insert(String::from("name"), field(ctx.effective_name()));
        fields.insert(String::from("email"), field(ctx.effective_email()));
        fields.insert(String::from("accessId"), field(ctx.effective_access_id()));
        let files = ctx.form.uploaded_files.clone();
        let result = submit_ticket(services, fields, TicketType::SecurityIncident, &files).await;
        store_submission(ctx, services, result, "security-incident");
    })
}

fn route_summary(chat: &ChatState, _ctx: &Context) -> String {
    if chat.user_input == SUBMIT {
        String::from("security_success")
    } else {
        String::from(START)
    }
}

/// Incident reports land with the cybersecurity team, so the terminal
/// wording differs from the shared ticket template.
fn generate_security_success_message(result: Option<&TicketSubmissionResult>) -> String {
    let Some(result) = result else {
        return String::from(
            "We apologize, but there was an error submitting your security incident report.\n\n\
             Please try again or contact our cybersecurity team directly.",
        );
    };
    if !result.success {
        return format!(
            "We apologize, but there was an error submitting your security incident report: {}\n\n\
             Please try again or contact our cybersecurity team directly.",
            result.error.as_deref().unwrap_or("Unknown error")
        );
    }
    if let (Some(url), Some(key)) = (&result.ticket_url, &result.ticket_key) {
        return format!(
            "Your security incident report has been submitted successfully.\n\n\
             Ticket: <a href=\"{}\" target=\"_blank\">{}</a>\n\n\
             Our cybersecurity team will review your report and respond accordingly. Thank you for helping keep ACCESS secure.",
            url, key
        );
    }
    String::from(
        "Your security incident report has been submitted successfully.\n\n\
         Our cybersecurity team will review your report and respond accordingly. Thank you for helping keep ACCESS secure.",
    )
}

fn success_message(_chat: &ChatState, ctx: &Context, _services: &Services) -> String {
    generate_security_success_message(ctx.submission.as_ref())
}

pub fn flow() -> Flow {
    let mut flow = Flow::new();
    flow.insert(
        "security_incident",
        FlowStep::say(
            "You're reporting a security incident. Please provide a brief summary of the security concern.",
        )
        .on_complete(set_summary)
        .goto("security_priority"),
    );
    flow.insert(
        "security_priority",
        FlowStep::say("What is the priority level of this security incident?")
            .options(&["Critical", "High", "Medium", "Low"])
            .on_complete(set_priority)
            .goto("security_description"),
    );
    flow.insert(
        "security_description",
        FlowStep::say("Please provide a detailed description of the security incident or concern.")
            .on_complete(set_description)
            .goto("security_attachment"),
    );
    flow.insert(
        "security_attachment",
        FlowStep::say(
            "Do you have any files (screenshots, logs, etc.) that would help with this security incident?",
        )
        .options(&["Yes", "No"])
        .on_complete(set_wants_attachment)
        .branch(route_attachment),
    );
    flow.insert(
        "security_upload",
        FlowStep::say("Please upload your files.")
            .upload()
            .options(&["Continue"])
            .on_complete(confirm_upload)
            .goto("security_contact_check"),
    );
    flow.insert(
        "security_contact_check",
        FlowStep::computed(contact_check_message)
            .options_fn(contact_check_options)
            .branch(route_contact_check),
    );
    flow.insert(
        "security_email",
        FlowStep::say("What is your email address?")
            .validator(validate_email)
            .on_complete(set_email)
            .branch(route_after_email),
    );
    flow.insert(
        "security_name",
        FlowStep::say("What is your name?")
            .on_complete(set_name)
            .branch(route_after_name),
    );
    flow.insert(
        "security_accessid",
        FlowStep::say("What is your ACCESS ID? (Optional - press Enter to skip)")
            .validator(validate_optional)
            .on_complete(set_access_id)
            .goto("security_summary"),
    );
    flow.insert(
        "security_summary",
        FlowStep::computed(summary_message)
            .options(&[SUBMIT, "Back to Main Menu"])
            .on_complete_async(submit)
            .branch(route_summary),
    );
    flow.insert(
        "security_success",
        FlowStep::computed(success_message)
            .options(&["Back to Main Menu"])
            .html(&[Role::Bot])
            .goto(START),
    );
    flow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(input: &str) -> ChatState {
        ChatState {
            user_input: String::from(input),
            prev_path: None,
        }
    }

    fn full_contact() -> Context {
        let mut ctx = Context::new("s");
        ctx.user.email = Some(String::from("a@b.edu"));
        ctx.user.name = Some(String::from("Ada"));
        ctx.user.access_id = Some(String::from("ada1"));
        ctx
    }

    #[test]
    fn contact_check_confirms_when_details_are_on_file() {
        let ctx = full_contact();
        let services = Services::new(crate::man::settings::Settings::default());
        let msg = contact_check_message(&state(""), &ctx, &services);
        assert!(msg.contains("Is this correct?"));
        assert_eq!(
            contact_check_options(&state(""), &ctx),
            vec![String::from(CONTACT_OK), String::from(CONTACT_EDIT)]
        );
    }

    #[test]
    fn contact_check_collects_when_details_are_missing() {
        let ctx = Context::new("s");
        let services = Services::new(crate::man::settings::Settings::default());
        let msg = contact_check_message(&state(""), &ctx, &services);
        assert_eq!(msg, "I need your contact information.");
        assert!(contact_check_options(&state(""), &ctx).is_empty());
        assert_eq!(route_contact_check(&state("whatever"), &ctx), "security_email");
    }

    #[test]
    fn confirmed_contact_goes_straight_to_summary() {
        let ctx = full_contact();
        assert_eq!(route_contact_check(&state(CONTACT_OK), &ctx), "security_summary");
        assert_eq!(route_contact_check(&state(CONTACT_EDIT), &ctx), "security_name");
    }

    #[test]
    fn security_success_wording_names_the_cybersecurity_team() {
        let ok = TicketSubmissionResult::created(
            Some(String::from("SEC-9")),
            Some(String::from("https://example.org/SEC-9")),
        );
        let msg = generate_security_success_message(Some(&ok));
        assert!(msg.contains("cybersecurity team"));
        assert!(msg.contains("SEC-9"));

        let failed = TicketSubmissionResult::failed(Some(500), String::from("boom"));
        let msg = generate_security_success_message(Some(&failed));
        assert!(msg.contains("error submitting your security incident report: boom"));

        let msg = generate_security_success_message(None);
        assert!(msg.contains("error submitting your security incident report."));
    }
}
