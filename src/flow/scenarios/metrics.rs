use futures::future::BoxFuture;
use tokio::time::{sleep, Duration};

use crate::external::http::qa;
use crate::external::Services;
use crate::flow::rt::context::Context;
use crate::flow::rt::dto::Response;
use crate::flow::rt::step::{ChatState, Flow, FlowStep, InputMode, Role};

pub const HELPFUL: &str = "\u{1f44d} Helpful";
pub const NOT_HELPFUL: &str = "\u{1f44e} Not helpful";

const FEEDBACK_THANKS: &str = "Thanks for the feedback! Ask another question about usage and performance metrics (XDMoD) or start a new chat.";
const GUIDANCE: &str =
    "Ask another question about usage and performance metrics (XDMoD) or start a new chat.";
const QUESTION_FAILED: &str =
    "I'm sorry, there was an error processing your question. Please try again.";
const GUIDANCE_DELAY_MS: u64 = 100;

fn intro_message(_chat: &ChatState, _ctx: &Context, services: &Services) -> String {
    format!(
        "Please type your question about usage and performance metrics (XDMoD) below. You can see some <a target=\"_blank\" href=\"{}\">examples here</a>.",
        services.settings.metrics_examples_url
    )
}

fn is_feedback(input: &str) -> bool {
    input == HELPFUL || input == NOT_HELPFUL
}

/// One loop iteration: feedback on the previous answer, or a fresh question
/// forwarded to the Q&A endpoint. Each question gets its own query id; only
/// the most recent one can receive feedback.
fn loop_message<'a>(
    chat: &'a ChatState,
    ctx: &'a mut Context,
    services: &'a Services,
    response: &'a mut Response,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let input = chat.user_input.as_str();
        if is_feedback(input) {
            let positive = input == HELPFUL;
            if let Some(query_id) = ctx.feedback_query_id.as_deref() {
                if let Err(e) =
                    qa::send_metrics_feedback(services, &ctx.session_id, query_id, positive).await
                {
                    log::error!("Failed to send metrics feedback: {:?}", e);
                }
            }
            services.track(
                "chatbot_metrics_feedback",
                &ctx.session_id,
                serde_json::json!({ "positive": positive }),
            );
            response.push_answer(String::from(FEEDBACK_THANKS));
            return;
        }
        let query_id = qa::generate_query_id();
        ctx.feedback_query_id = Some(query_id.clone());
        match qa::ask_metrics_question(services, &ctx.session_id, &query_id, input).await {
            Ok(answer) => {
                response.push_answer(answer);
                sleep(Duration::from_millis(GUIDANCE_DELAY_MS)).await;
                response.push_answer(String::from(GUIDANCE));
            }
            Err(e) => {
                log::error!("Metrics question failed: {:?}", e);
                response.push_answer(String::from(QUESTION_FAILED));
            }
        }
    })
}

fn loop_options(chat: &ChatState, _ctx: &Context) -> Vec<String> {
    // No feedback buttons right after feedback was given.
    if is_feedback(&chat.user_input) {
        Vec::new()
    } else {
        vec![String::from(HELPFUL), String::from(NOT_HELPFUL)]
    }
}

pub fn flow() -> Flow {
    let mut flow = Flow::new();
    flow.insert(
        "metrics_intro",
        FlowStep::computed(intro_message)
            .html(&[Role::Bot])
            .goto("metrics_loop"),
    );
    flow.insert(
        "metrics_loop",
        FlowStep::dynamic(loop_message)
            .options_fn(loop_options)
            .input_mode(InputMode::TextEnabled)
            .goto("metrics_loop"),
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

    #[test]
    fn feedback_labels_are_recognized() {
        assert!(is_feedback(HELPFUL));
        assert!(is_feedback(NOT_HELPFUL));
        assert!(!is_feedback("How many jobs ran last month?"));
    }

    #[test]
    fn options_disappear_after_feedback() {
        let ctx = Context::new("s");
        assert!(loop_options(&state(HELPFUL), &ctx).is_empty());
        assert_eq!(
            loop_options(&state("a question"), &ctx),
            vec![String::from(HELPFUL), String::from(NOT_HELPFUL)]
        );
    }

    #[test]
    fn loop_keeps_text_input_enabled_despite_buttons() {
        let flow = flow();
        let step = flow.get("metrics_loop").unwrap();
        let ctx = Context::new("s");
        let evaluated = step.evaluated_options(&state("a question"), &ctx);
        assert_eq!(step.effective_input_mode(&evaluated), InputMode::TextEnabled);
    }
}
