use crate::external::Services;
use crate::flow::rt::context::Context;
use crate::flow::rt::step::{ChatState, Flow, FlowStep, QA_LOOP, START};

pub const ASK_QUESTION: &str = "Ask a question about ACCESS";
pub const OPEN_TICKET: &str = "Open a Help Ticket";
pub const METRICS: &str = "Usage and performance of ACCESS resources (XDMoD)";
pub const SECURITY: &str = "Report a security issue";

fn welcome(_chat: &ChatState, _ctx: &Context, services: &Services) -> String {
    services.settings.welcome_message.clone()
}

fn reset_for_scenario(chat: &ChatState, ctx: &mut Context) {
    // Leaving the menu for anything but the Q&A loop begins a new intake,
    // so stale form fields from an abandoned one must not leak in.
    if chat.user_input != ASK_QUESTION {
        ctx.reset_form();
    }
}

fn route_menu(chat: &ChatState, _ctx: &Context) -> String {
    String::from(match chat.user_input.as_str() {
        ASK_QUESTION => "go_ahead_and_ask",
        OPEN_TICKET => "help_ticket",
        METRICS => "metrics_intro",
        SECURITY => "security_incident",
        _ => START,
    })
}

fn remember_ticket_type(chat: &ChatState, ctx: &mut Context) {
    ctx.form.ticket_type = Some(chat.user_input.clone());
}

fn route_ticket_type(chat: &ChatState, _ctx: &Context) -> String {
    String::from(match chat.user_input.as_str() {
        "Logging into ACCESS website" => "access_help",
        "Logging into a resource" => "resource_help",
        "Another question" => "general_help_summary_subject",
        _ => "help_ticket",
    })
}

pub fn flow() -> Flow {
    let mut flow = Flow::new();
    flow.insert(
        START,
        FlowStep::computed(welcome)
            .options(&[ASK_QUESTION, OPEN_TICKET, METRICS, SECURITY])
            .on_complete(reset_for_scenario)
            .branch(route_menu),
    );
    flow.insert(
        "go_ahead_and_ask",
        FlowStep::say("Go ahead and ask your question! I'll do my best to help.").goto(QA_LOOP),
    );
    flow.insert(
        "help_ticket",
        FlowStep::say("What is your help ticket related to?")
            .options(&[
                "Logging into ACCESS website",
                "Logging into a resource",
                "Another question",
            ])
            .on_complete(remember_ticket_type)
            .branch(route_ticket_type),
    );
    flow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::rt::step::Next;

    fn state(input: &str) -> ChatState {
        ChatState {
            user_input: String::from(input),
            prev_path: None,
        }
    }

    #[test]
    fn menu_routes_every_option() {
        let ctx = Context::new("s");
        assert_eq!(route_menu(&state(ASK_QUESTION), &ctx), "go_ahead_and_ask");
        assert_eq!(route_menu(&state(OPEN_TICKET), &ctx), "help_ticket");
        assert_eq!(route_menu(&state(METRICS), &ctx), "metrics_intro");
        assert_eq!(route_menu(&state(SECURITY), &ctx), "security_incident");
        assert_eq!(route_menu(&state("gibberish"), &ctx), START);
    }

    #[test]
    fn non_qa_selection_resets_the_form() {
        let mut ctx = Context::new("s");
        ctx.form.summary = Some(String::from("leftover"));
        reset_for_scenario(&state(OPEN_TICKET), &mut ctx);
        assert!(ctx.form.summary.is_none());

        ctx.form.summary = Some(String::from("kept"));
        reset_for_scenario(&state(ASK_QUESTION), &mut ctx);
        assert_eq!(ctx.form.summary.as_deref(), Some("kept"));
    }

    #[test]
    fn ticket_type_selection_routes_to_each_intake() {
        let ctx = Context::new("s");
        assert_eq!(
            route_ticket_type(&state("Logging into ACCESS website"), &ctx),
            "access_help"
        );
        assert_eq!(
            route_ticket_type(&state("Logging into a resource"), &ctx),
            "resource_help"
        );
        assert_eq!(
            route_ticket_type(&state("Another question"), &ctx),
            "general_help_summary_subject"
        );
        assert_eq!(route_ticket_type(&state("?"), &ctx), "help_ticket");
    }

    #[test]
    fn qa_handoff_targets_the_reserved_loop() {
        let flow = flow();
        let step = flow.get("go_ahead_and_ask").unwrap();
        assert!(matches!(step.next, Next::Goto(QA_LOOP)));
    }
}
