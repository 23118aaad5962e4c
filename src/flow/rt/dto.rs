use std::vec::Vec;

use serde::{Deserialize, Serialize};

use super::context::UserInfo;
use super::step::{Checkboxes, InputMode, Role};
use crate::external::attachment::UploadedFile;
use crate::flow::validation::Validation;

/// One user turn as reported by the chat engine. An empty `userInput` on a
/// fresh session opens the conversation at the root step.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "userInput", default)]
    pub user_input: String,
    #[serde(rename = "userInfo", default)]
    pub user_info: Option<UserInfo>,
    #[serde(default)]
    pub attachments: Vec<UploadedFile>,
}

/// Engine-facing actions beyond rendering the next step.
#[derive(Debug, Eq, PartialEq, Serialize)]
pub enum NextAction {
    #[serde(rename = "NONE")]
    None,
    /// Hand the conversation to the engine's built-in Q&A loop.
    #[serde(rename = "QA_LOOP")]
    QaLoop,
}

#[derive(Debug, Serialize)]
pub struct ValidationPrompt {
    pub content: String,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "promptType")]
    pub prompt_type: &'static str,
}

impl ValidationPrompt {
    pub fn from_verdict(v: Validation) -> Option<Self> {
        if v.success {
            return None;
        }
        Some(Self {
            content: v.prompt_content.unwrap_or_default(),
            duration_ms: v.prompt_duration_ms.unwrap_or(3000),
            prompt_type: v.prompt_type.unwrap_or("error"),
        })
    }
}

/// Everything the engine needs to render the step the conversation landed
/// on: messages in order, the input controls, and markup roles.
#[derive(Debug, Serialize)]
pub struct Response {
    pub answers: Vec<String>,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkboxes: Option<Checkboxes>,
    #[serde(rename = "inputMode")]
    pub input_mode: InputMode,
    #[serde(rename = "renderAsHtml")]
    pub render_as_html: Vec<Role>,
    #[serde(rename = "fileUpload")]
    pub file_upload: bool,
    pub step: String,
    #[serde(rename = "nextAction")]
    pub next_action: NextAction,
    #[serde(rename = "validationPrompt", skip_serializing_if = "Option::is_none")]
    pub validation_prompt: Option<ValidationPrompt>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            answers: Vec::with_capacity(2),
            options: Vec::new(),
            checkboxes: None,
            input_mode: InputMode::TextEnabled,
            render_as_html: Vec::new(),
            file_upload: false,
            step: String::new(),
            next_action: NextAction::None,
            validation_prompt: None,
        }
    }

    pub fn push_answer(&mut self, text: String) {
        self.answers.push(text);
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
