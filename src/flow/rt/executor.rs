use super::context::{Context, SessionStore};
use super::dto::{NextAction, Request, Response, ValidationPrompt};
use super::step::{ChatState, Next, OnComplete, StepMessage, QA_LOOP, START};
use crate::external::Services;
use crate::flow::scenarios::FlowTable;
use crate::result::{Error, Result};

/// Runs one user turn: validate the input against the step the session is
/// on, run its completion handler, pick the next step and render it.
pub async fn process(
    req: Request,
    store: &SessionStore,
    services: &Services,
    table: &FlowTable,
) -> Result<Response> {
    let mut ctx = store.take(&req.session_id).await;
    if let Some(user) = req.user_info {
        ctx.user = user;
    }
    if !req.attachments.is_empty() {
        ctx.form.uploaded_files.extend(req.attachments);
    }
    let chat = ChatState {
        user_input: req.user_input,
        prev_path: ctx.current_step.clone(),
    };
    let mut response = Response::new();
    let outcome = run_turn(&chat, &mut ctx, services, table, &mut response).await;
    store.put(ctx).await;
    outcome.map(|_| response)
}

async fn run_turn(
    chat: &ChatState,
    ctx: &mut Context,
    services: &Services,
    table: &FlowTable,
    response: &mut Response,
) -> Result<()> {
    let current = match ctx.current_step.clone() {
        None => {
            // Context-unavailable degrade path: a mid-conversation turn
            // for a session we no longer hold starts over with an empty
            // form instead of failing.
            if !chat.user_input.is_empty() {
                log::warn!(
                    "No context for session {}, starting a fresh conversation",
                    &ctx.session_id
                );
            }
            return enter_step(START, chat, ctx, services, table, response).await;
        }
        Some(c) => c,
    };
    let Some(step) = table.get(&current) else {
        log::error!(
            "Session {} was on unknown step {:?}, resetting to {}",
            &ctx.session_id,
            &current,
            START
        );
        ctx.prev_step = None;
        return enter_step(START, chat, ctx, services, table, response).await;
    };

    if let Some(validator) = step.validator {
        let verdict = validator(&chat.user_input);
        if !verdict.success {
            // Re-prompt the same step without advancing.
            response.step = current;
            let evaluated = step.evaluated_options(chat, ctx);
            response.input_mode = step.effective_input_mode(&evaluated);
            response.options = evaluated;
            response.validation_prompt = ValidationPrompt::from_verdict(verdict);
            return Ok(());
        }
    }

    match &step.on_complete {
        OnComplete::None => {}
        OnComplete::Sync(f) => f(chat, ctx),
        OnComplete::Async(f) => f(chat, ctx, services).await,
    }

    if current == START {
        services.track(
            "chatbot_menu_selected",
            &ctx.session_id,
            serde_json::json!({ "option": &chat.user_input }),
        );
    }

    let next_id = match &step.next {
        Next::Goto(id) => String::from(*id),
        Next::Branch(f) => f(chat, ctx),
    };

    if next_id == QA_LOOP {
        // The engine owns the Q&A loop; park the session at the root so a
        // later turn resumes at the menu.
        response.next_action = NextAction::QaLoop;
        response.step = String::from(QA_LOOP);
        ctx.prev_step = Some(current);
        ctx.current_step = Some(String::from(START));
        return Ok(());
    }

    if table.get(&next_id).is_none() {
        log::error!(
            "Step {} routed to missing step {}, resetting session {} to {}",
            &current,
            &next_id,
            &ctx.session_id,
            START
        );
        ctx.prev_step = None;
        return enter_step(START, chat, ctx, services, table, response).await;
    }

    ctx.prev_step = Some(current);
    enter_step(&next_id, chat, ctx, services, table, response).await
}

/// Renders `id` into the response and marks it as the session's current
/// step. Dynamic messages may inject several answers themselves.
async fn enter_step(
    id: &str,
    chat: &ChatState,
    ctx: &mut Context,
    services: &Services,
    table: &FlowTable,
    response: &mut Response,
) -> Result<()> {
    let Some(step) = table.get(id) else {
        return Err(Error::ErrorWithMessage(format!(
            "Flow table has no step {}",
            id
        )));
    };
    ctx.current_step = Some(String::from(id));
    response.step = String::from(id);
    match &step.message {
        StepMessage::Literal(text) => response.push_answer(text.clone()),
        StepMessage::Computed(f) => {
            let text = f(chat, ctx, services);
            response.push_answer(text);
        }
        StepMessage::Dynamic(f) => f(chat, ctx, services, response).await,
    }
    let evaluated = step.evaluated_options(chat, ctx);
    response.input_mode = step.effective_input_mode(&evaluated);
    response.options = evaluated;
    response.checkboxes = step.checkboxes.clone();
    response.render_as_html = step.render_as_html.to_vec();
    response.file_upload = step.upload;
    Ok(())
}
