use futures::future::BoxFuture;

use super::{field, next_missing_contact, store_submission};
use crate::external::http::client::{generate_success_message, submit_ticket, TicketType};
use crate::external::Services;
use crate::flow::rt::context::{or_not_provided, Context};
use crate::flow::rt::step::{ChatState, Flow, FlowStep, Role, START};
use crate::flow::validation::{process_optional_input, validate_email, validate_optional};

const CREATE_TICKET: &str = "Yes, let's create a ticket";
const SUBMIT: &str = "Submit Ticket";

fn route_intro(chat: &ChatState, _ctx: &Context) -> String {
    if chat.user_input == CREATE_TICKET {
        String::from("resource_login_description")
    } else {
        String::from(START)
    }
}

fn set_description(chat: &ChatState, ctx: &mut Context) {
    ctx.form.description = Some(chat.user_input.clone());
}

fn set_resource_name(chat: &ChatState, ctx: &mut Context) {
    ctx.form.resource_name = Some(chat.user_input.clone());
}

fn set_user_id_at_resource(chat: &ChatState, ctx: &mut Context) {
    ctx.form.user_id_at_resource = Some(process_optional_input(&chat.user_input));
}

fn set_identity_provider(chat: &ChatState, ctx: &mut Context) {
    ctx.form.identity_provider = Some(chat.user_input.clone());
}

fn set_browser(chat: &ChatState, ctx: &mut Context) {
    ctx.form.browser = Some(chat.user_input.clone());
}

fn set_wants_attachment(chat: &ChatState, ctx: &mut Context) {
    ctx.form.wants_attachment = Some(chat.user_input.clone());
}

fn route_attachment(chat: &ChatState, ctx: &Context) -> String {
    if chat.user_input == "Yes" {
        return String::from("resource_login_upload");
    }
    route_contact(chat, ctx)
}

fn confirm_upload(_chat: &ChatState, ctx: &mut Context) {
    ctx.form.upload_confirmed = true;
}

fn route_contact(_chat: &ChatState, ctx: &Context) -> String {
    next_missing_contact(
        ctx,
        "resource_login_email",
        "resource_login_name",
        "resource_login_accessid",
        "resource_login_summary",
    )
}

fn set_email(chat: &ChatState, ctx: &mut Context) {
    ctx.form.email = Some(chat.user_input.clone());
}

fn set_name(chat: &ChatState, ctx: &mut Context) {
    ctx.form.name = Some(chat.user_input.clone());
}

fn set_access_id(chat: &ChatState, ctx: &mut Context) {
    ctx.form.access_id = Some(process_optional_input(&chat.user_input));
}

fn summary_message(_chat: &ChatState, ctx: &Context, _services: &Services) -> String {
    format!(
        "Thank you for providing your resource login issue details. Here's a summary:\n\n\
         Name: {}\n\
         Email: {}\n\
         ACCESS ID: {}\n\
         Resource: {}\n\
         Username at Resource: {}\n\
         Identity Provider: {}\n\
         Browser: {}\n\
         Issue Description: {}{}\n\n\
         Would you like to submit this ticket?",
        or_not_provided(ctx.effective_name()),
        or_not_provided(ctx.effective_email()),
        or_not_provided(ctx.effective_access_id()),
        or_not_provided(ctx.form.resource_name.as_deref()),
        or_not_provided(ctx.form.user_id_at_resource.as_deref()),
        or_not_provided(ctx.form.identity_provider.as_deref()),
        or_not_provided(ctx.form.browser.as_deref()),
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
        fields.insert(String::from("email"), field(ctx.effective_email()));
        fields.insert(String::from("name"), field(ctx.effective_name()));
        fields.insert(String::from("accessId"), field(ctx.effective_access_id()));
        fields.insert(
            String::from("description"),
            field(ctx.form.description.as_deref()),
        );
        fields.insert(
            String::from("resourceName"),
            field(ctx.form.resource_name.as_deref()),
        );
        fields.insert(
            String::from("userIdAtResource"),
            field(ctx.form.user_id_at_resource.as_deref()),
        );
        fields.insert(
            String::from("identityProvider"),
            field(ctx.form.identity_provider.as_deref()),
        );
        fields.insert(String::from("browser"), field(ctx.form.browser.as_deref()));
        let files = ctx.form.uploaded_files.clone();
        let result = submit_ticket(services, fields, TicketType::ResourceLoginHelp, &files).await;
        store_submission(ctx, services, result, "resource-login-help");
    })
}

fn route_summary(chat: &ChatState, _ctx: &Context) -> String {
    if chat.user_input == SUBMIT {
        String::from("resource_login_success")
    } else {
        String::from(START)
    }
}

fn success_message(_chat: &ChatState, ctx: &Context, _services: &Services) -> String {
    generate_success_message(ctx.submission.as_ref(), "resource login ticket")
}

pub fn flow() -> Flow {
    let mut flow = Flow::new();
    flow.insert(
        "resource_help",
        FlowStep::say(
            "If you're having trouble logging into an ACCESS-affiliated resource, here are some common issues:\n\n\
             \u{2022} Make sure your ACCESS account is linked to the resource\n\
             \u{2022} Check that your allocation on the resource is active\n\
             \u{2022} Verify you're using the correct username for that resource\n\
             \u{2022} Some resources require SSH keys or two-factor authentication\n\n\
             Would you like to submit a help ticket for resource login issues?",
        )
        .options(&[CREATE_TICKET, "Back to Main Menu"])
        .branch(route_intro),
    );
    flow.insert(
        "resource_login_description",
        FlowStep::say("Describe your login issue.")
            .on_complete(set_description)
            .goto("resource_login_which_resource"),
    );
    flow.insert(
        "resource_login_which_resource",
        FlowStep::say("Which resource are you trying to access?")
            .options(&[
                "Anvil (Purdue)",
                "Bridges-2 (PSC)",
                "Darwin (UD)",
                "Delta (NCSA)",
                "Expanse (SDSC)",
                "Frontera (TACC)",
                "Jetstream2",
                "Ookami (Stony Brook)",
                "Stampede3 (TACC)",
                "Other",
            ])
            .on_complete(set_resource_name)
            .goto("resource_login_username"),
    );
    flow.insert(
        "resource_login_username",
        FlowStep::say("What is your username at this resource? (Optional - press Enter to skip)")
            .validator(validate_optional)
            .on_complete(set_user_id_at_resource)
            .goto("resource_login_identity"),
    );
    flow.insert(
        "resource_login_identity",
        FlowStep::say("Which identity provider were you using?")
            .options(&[
                "ACCESS",
                "Github",
                "Google",
                "Institution",
                "Microsoft",
                "ORCID",
                "Other",
            ])
            .on_complete(set_identity_provider)
            .goto("resource_login_browser"),
    );
    flow.insert(
        "resource_login_browser",
        FlowStep::say("Which browser were you using?")
            .options(&["Chrome", "Firefox", "Edge", "Safari", "SSH/Terminal", "Other"])
            .on_complete(set_browser)
            .goto("resource_login_attachment"),
    );
    flow.insert(
        "resource_login_attachment",
        FlowStep::say("Would you like to attach a screenshot or error log?")
            .options(&["Yes", "No"])
            .on_complete(set_wants_attachment)
            .branch(route_attachment),
    );
    flow.insert(
        "resource_login_upload",
        FlowStep::say("Please upload your screenshot or error log.")
            .upload()
            .options(&["Continue"])
            .on_complete(confirm_upload)
            .branch(route_contact),
    );
    flow.insert(
        "resource_login_email",
        FlowStep::say("What is your email?")
            .validator(validate_email)
            .on_complete(set_email)
            .branch(route_contact),
    );
    flow.insert(
        "resource_login_name",
        FlowStep::say("What is your name?")
            .on_complete(set_name)
            .branch(route_contact),
    );
    flow.insert(
        "resource_login_accessid",
        FlowStep::say("What is your ACCESS ID? (Optional - press Enter to skip)")
            .validator(validate_optional)
            .on_complete(set_access_id)
            .goto("resource_login_summary"),
    );
    flow.insert(
        "resource_login_summary",
        FlowStep::computed(summary_message)
            .options(&[SUBMIT, "Back to Main Menu"])
            .html(&[Role::Bot, Role::User])
            .on_complete_async(submit)
            .branch(route_summary),
    );
    flow.insert(
        "resource_login_success",
        FlowStep::computed(success_message)
            .options(&["Back to Main Menu"])
            .html(&[Role::Bot])
            .goto(START),
    );
    flow
}
