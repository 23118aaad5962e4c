use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::Serialize;

use super::context::Context;
use super::dto::Response;
use crate::external::Services;
use crate::flow::validation::Validation;

/// Root of the merged graph, owned by the main menu scenario.
pub const START: &str = "start";
/// The chat engine's built-in Q&A loop; our graph hands off here.
pub const QA_LOOP: &str = "qa_loop";
/// Step ids a `next` target may name without being present in the table.
pub const RESERVED_IDS: &[&str] = &[QA_LOOP];

/// What the engine reports about the turn that just happened.
#[derive(Clone, Debug)]
pub struct ChatState {
    pub user_input: String,
    pub prev_path: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum InputMode {
    #[serde(rename = "TEXT_ENABLED")]
    TextEnabled,
    #[serde(rename = "BUTTONS_ONLY")]
    ButtonsOnly,
}

/// Message roles whose content is interpreted as markup rather than escaped.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Role {
    #[serde(rename = "BOT")]
    Bot,
    #[serde(rename = "USER")]
    User,
}

pub type MessageFn = fn(&ChatState, &Context, &Services) -> String;
pub type DynamicMessageFn =
    for<'a> fn(&'a ChatState, &'a mut Context, &'a Services, &'a mut Response) -> BoxFuture<'a, ()>;
pub type OptionsFn = fn(&ChatState, &Context) -> Vec<String>;
pub type ValidatorFn = fn(&str) -> Validation;
pub type CompletionFn = fn(&ChatState, &mut Context);
pub type AsyncCompletionFn =
    for<'a> fn(&'a ChatState, &'a mut Context, &'a Services) -> BoxFuture<'a, ()>;
pub type NextFn = fn(&ChatState, &Context) -> String;

/// A step prompt: fixed text, derived from session state, or produced by a
/// network call that may inject several answers into the response itself.
pub enum StepMessage {
    Literal(String),
    Computed(MessageFn),
    Dynamic(DynamicMessageFn),
}

pub enum StepOptions {
    None,
    Literal(Vec<String>),
    Computed(OptionsFn),
}

#[derive(Clone, Debug, Serialize)]
pub struct Checkboxes {
    pub items: Vec<String>,
    pub min: usize,
    pub max: usize,
}

/// Side effect run once the step's input is accepted. Async completions
/// settle before `next` is evaluated.
pub enum OnComplete {
    None,
    Sync(CompletionFn),
    Async(AsyncCompletionFn),
}

pub enum Next {
    Goto(&'static str),
    Branch(NextFn),
}

/// One node in a conversation graph.
pub struct FlowStep {
    pub message: StepMessage,
    pub options: StepOptions,
    pub checkboxes: Option<Checkboxes>,
    pub input_mode: Option<InputMode>,
    pub validator: Option<ValidatorFn>,
    pub on_complete: OnComplete,
    pub next: Next,
    pub render_as_html: &'static [Role],
    /// Ask the engine to show its file upload control alongside this step.
    pub upload: bool,
}

pub type Flow = HashMap<&'static str, FlowStep>;

impl FlowStep {
    fn base(message: StepMessage) -> Self {
        Self {
            message,
            options: StepOptions::None,
            checkboxes: None,
            input_mode: None,
            validator: None,
            on_complete: OnComplete::None,
            next: Next::Goto(START),
            render_as_html: &[],
            upload: false,
        }
    }

    pub fn say(message: &str) -> Self {
        Self::base(StepMessage::Literal(String::from(message)))
    }

    pub fn computed(f: MessageFn) -> Self {
        Self::base(StepMessage::Computed(f))
    }

    pub fn dynamic(f: DynamicMessageFn) -> Self {
        Self::base(StepMessage::Dynamic(f))
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = StepOptions::Literal(options.iter().map(|o| String::from(*o)).collect());
        self
    }

    pub fn options_fn(mut self, f: OptionsFn) -> Self {
        self.options = StepOptions::Computed(f);
        self
    }

    pub fn checkboxes(mut self, items: &[&str], min: usize, max: usize) -> Self {
        self.checkboxes = Some(Checkboxes {
            items: items.iter().map(|i| String::from(*i)).collect(),
            min,
            max,
        });
        self
    }

    pub fn input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = Some(mode);
        self
    }

    pub fn validator(mut self, f: ValidatorFn) -> Self {
        self.validator = Some(f);
        self
    }

    pub fn on_complete(mut self, f: CompletionFn) -> Self {
        self.on_complete = OnComplete::Sync(f);
        self
    }

    pub fn on_complete_async(mut self, f: AsyncCompletionFn) -> Self {
        self.on_complete = OnComplete::Async(f);
        self
    }

    pub fn goto(mut self, id: &'static str) -> Self {
        self.next = Next::Goto(id);
        self
    }

    pub fn branch(mut self, f: NextFn) -> Self {
        self.next = Next::Branch(f);
        self
    }

    pub fn html(mut self, roles: &'static [Role]) -> Self {
        self.render_as_html = roles;
        self
    }

    pub fn upload(mut self) -> Self {
        self.upload = true;
        self
    }

    pub fn evaluated_options(&self, chat: &ChatState, ctx: &Context) -> Vec<String> {
        match &self.options {
            StepOptions::None => Vec::new(),
            StepOptions::Literal(opts) => opts.clone(),
            StepOptions::Computed(f) => f(chat, ctx),
        }
    }

    fn has_checkbox_items(&self) -> bool {
        self.checkboxes.as_ref().is_some_and(|c| !c.items.is_empty())
    }

    /// Input mode for a rendered step. Computed options are only known per
    /// turn, so their derivation happens here rather than in the resolver.
    pub fn effective_input_mode(&self, evaluated_options: &[String]) -> InputMode {
        if let Some(mode) = self.input_mode {
            return mode;
        }
        if !evaluated_options.is_empty() || self.has_checkbox_items() {
            InputMode::ButtonsOnly
        } else {
            InputMode::TextEnabled
        }
    }
}

/// Fills `input_mode` where the author left it out: non-empty literal
/// options or checkbox items mean buttons only, otherwise free text. An
/// explicit author value always wins. Idempotent.
pub fn resolve_step(mut step: FlowStep) -> FlowStep {
    if step.input_mode.is_some() {
        return step;
    }
    step.input_mode = match &step.options {
        StepOptions::Literal(opts) if !opts.is_empty() => Some(InputMode::ButtonsOnly),
        // Deferred to render time; see effective_input_mode.
        StepOptions::Computed(_) => None,
        _ => {
            if step.has_checkbox_items() {
                Some(InputMode::ButtonsOnly)
            } else {
                Some(InputMode::TextEnabled)
            }
        }
    };
    step
}

pub fn resolve_flow(flow: Flow) -> Flow {
    flow.into_iter().map(|(id, step)| (id, resolve_step(step))).collect()
}
