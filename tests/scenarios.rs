use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use supportbot::analytics::TrackEvent;
use supportbot::external::Services;
use supportbot::flow::rt::context::SessionStore;
use supportbot::flow::rt::dto::{NextAction, Request, Response};
use supportbot::flow::rt::executor::process;
use supportbot::flow::rt::step::InputMode;
use supportbot::flow::scenarios::{build_flow_table, FlowTable};
use supportbot::man::settings::Settings;

struct Harness {
    store: SessionStore,
    services: Services,
    table: FlowTable,
}

impl Harness {
    fn new(settings: Settings) -> Self {
        Self {
            store: SessionStore::new(),
            services: Services::new(settings),
            table: build_flow_table().unwrap(),
        }
    }

    fn with_event_log(settings: Settings) -> (Self, Arc<Mutex<Vec<TrackEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let services = Services::new(settings)
            .with_analytics(Box::new(move |e| sink.lock().unwrap().push(e)));
        let h = Self {
            store: SessionStore::new(),
            services,
            table: build_flow_table().unwrap(),
        };
        (h, events)
    }

    async fn turn(&self, session: &str, input: &str) -> Response {
        let req = Request {
            session_id: String::from(session),
            user_input: String::from(input),
            user_info: None,
            attachments: Vec::new(),
        };
        process(req, &self.store, &self.services, &self.table)
            .await
            .unwrap()
    }
}

fn settings_against(server: &MockServer) -> Settings {
    let mut s = Settings::default();
    s.proxy_base_url = server.uri();
    s.qa_endpoint = format!("{}/chat/api/", server.uri());
    s.rating_endpoint = format!("{}/chat/rating/", server.uri());
    s
}

#[tokio::test]
async fn website_login_ticket_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tickets"))
        .and(body_partial_json(json!({
            "serviceDeskId": 2,
            "requestTypeId": 30,
            "requestFieldValues": {
                "email": "ada@example.edu",
                "name": "Ada Lovelace",
                "accessId": "",
                "browser": "Chrome",
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "ticketKey": "ACCESS-123", "ticketUrl": "https://example.org/ACCESS-123" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = Harness::new(settings_against(&server));
    let s = "web-login-session";

    assert_eq!(h.turn(s, "").await.step, "start");
    assert_eq!(h.turn(s, "Open a Help Ticket").await.step, "help_ticket");
    assert_eq!(
        h.turn(s, "Logging into ACCESS website").await.step,
        "access_help"
    );
    assert_eq!(
        h.turn(s, "Yes, let's create a ticket").await.step,
        "access_login_description"
    );
    assert_eq!(
        h.turn(s, "SSO redirect loops forever").await.step,
        "access_login_identity"
    );
    assert_eq!(h.turn(s, "ACCESS").await.step, "access_login_browser");
    assert_eq!(h.turn(s, "Chrome").await.step, "access_login_attachment");
    assert_eq!(h.turn(s, "No").await.step, "access_login_email");
    assert_eq!(h.turn(s, "ada@example.edu").await.step, "access_login_name");
    assert_eq!(h.turn(s, "Ada Lovelace").await.step, "access_login_accessid");

    let summary = h.turn(s, "skip").await;
    assert_eq!(summary.step, "access_login_summary");
    let text = summary.answers.join("\n");
    assert!(text.contains("Name: Ada Lovelace"));
    assert!(text.contains("Email: ada@example.edu"));
    assert!(text.contains("ACCESS ID: Not provided"));
    assert!(text.contains("Issue Description: SSO redirect loops forever"));
    assert_eq!(summary.input_mode, InputMode::ButtonsOnly);

    let done = h.turn(s, "Submit Ticket").await;
    assert_eq!(done.step, "access_login_success");
    let text = done.answers.join("\n");
    assert!(text.contains("ACCESS login ticket has been submitted successfully"));
    assert!(text.contains("ACCESS-123"));
}

#[tokio::test]
async fn rejected_submission_reports_the_fixed_wording() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tickets"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let (h, events) = Harness::with_event_log(settings_against(&server));
    let s = "forbidden-session";

    h.turn(s, "").await;
    h.turn(s, "Open a Help Ticket").await;
    h.turn(s, "Logging into ACCESS website").await;
    h.turn(s, "Yes, let's create a ticket").await;
    h.turn(s, "cannot log in").await;
    h.turn(s, "Google").await;
    h.turn(s, "Firefox").await;
    h.turn(s, "No").await;
    h.turn(s, "ada@example.edu").await;
    h.turn(s, "Ada").await;
    h.turn(s, "skip").await;

    let done = h.turn(s, "Submit Ticket").await;
    assert_eq!(done.step, "access_login_success");
    let text = done.answers.join("\n");
    assert!(text.contains("error submitting your ACCESS login ticket"));
    assert!(text.contains(
        "The ticket service is temporarily unavailable. Please try again later or contact support directly."
    ));

    let events = events.lock().unwrap();
    let submitted = events
        .iter()
        .find(|e| e.event_type == "chatbot_ticket_submitted")
        .expect("submission event");
    assert_eq!(submitted.detail["success"], json!(false));
    assert_eq!(submitted.detail["status"], json!(403));
    assert_eq!(submitted.detail["ticketType"], json!("website-login-help"));
}

#[tokio::test]
async fn invalid_email_reprompts_without_advancing() {
    let server = MockServer::start().await;
    let h = Harness::new(settings_against(&server));
    let s = "validation-session";

    h.turn(s, "").await;
    h.turn(s, "Open a Help Ticket").await;
    h.turn(s, "Logging into ACCESS website").await;
    h.turn(s, "Yes, let's create a ticket").await;
    h.turn(s, "cannot log in").await;
    h.turn(s, "Google").await;
    h.turn(s, "Firefox").await;
    assert_eq!(h.turn(s, "No").await.step, "access_login_email");

    let rejected = h.turn(s, "not-an-email").await;
    assert_eq!(rejected.step, "access_login_email");
    let prompt = rejected.validation_prompt.expect("validation prompt");
    assert_eq!(prompt.content, "Please enter a valid email address");
    assert_eq!(prompt.duration_ms, 3000);

    assert_eq!(h.turn(s, "ada@example.edu").await.step, "access_login_name");
}

#[tokio::test]
async fn metrics_question_then_feedback_sends_one_rating() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/api/"))
        .and(header("X-Origin", "metrics"))
        .and(body_partial_json(json!({ "query": "How many jobs ran last month?" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "response": "About 120k jobs." })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/rating/"))
        .and(header("X-Origin", "metrics"))
        .and(header("X-Feedback", "1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = Harness::new(settings_against(&server));
    let s = "metrics-session";

    h.turn(s, "").await;
    let intro = h
        .turn(s, "Usage and performance of ACCESS resources (XDMoD)")
        .await;
    assert_eq!(intro.step, "metrics_intro");
    assert!(intro.answers.join("").contains("examples here"));

    let answered = h.turn(s, "How many jobs ran last month?").await;
    assert_eq!(answered.step, "metrics_loop");
    assert_eq!(
        answered.answers,
        vec![
            String::from("About 120k jobs."),
            String::from(
                "Ask another question about usage and performance metrics (XDMoD) or start a new chat."
            ),
        ]
    );
    assert_eq!(
        answered.options,
        vec![
            String::from("\u{1f44d} Helpful"),
            String::from("\u{1f44e} Not helpful")
        ]
    );
    assert_eq!(answered.input_mode, InputMode::TextEnabled);

    let thanked = h.turn(s, "\u{1f44d} Helpful").await;
    assert_eq!(thanked.step, "metrics_loop");
    assert_eq!(
        thanked.answers,
        vec![String::from(
            "Thanks for the feedback! Ask another question about usage and performance metrics (XDMoD) or start a new chat."
        )]
    );
    assert!(thanked.options.is_empty());
    // The expect(1) counters on both mocks verify no extra question or
    // rating request went out for the feedback turn.
}

#[tokio::test]
async fn keyword_sentinel_detours_through_free_text() {
    let server = MockServer::start().await;
    let h = Harness::new(settings_against(&server));
    let s = "keywords-session";

    h.turn(s, "").await;
    h.turn(s, "Open a Help Ticket").await;
    assert_eq!(
        h.turn(s, "Another question").await.step,
        "general_help_summary_subject"
    );
    h.turn(s, "Scheduler keeps killing my job").await;
    h.turn(s, "User Support Question").await;
    h.turn(s, "Jobs die after two hours").await;
    h.turn(s, "No").await;
    let keywords = h.turn(s, "No").await;
    assert_eq!(keywords.step, "general_help_keywords");
    assert!(keywords.checkboxes.is_some());

    let detour = h
        .turn(s, "SLURM, I don't see a relevant keyword")
        .await;
    assert_eq!(detour.step, "general_help_additional_keywords");
    assert_eq!(
        h.turn(s, "preemption budgets").await.step,
        "general_help_priority"
    );
}

#[tokio::test]
async fn qa_menu_option_hands_off_to_the_engine_loop() {
    let server = MockServer::start().await;
    let h = Harness::new(settings_against(&server));
    let s = "qa-session";

    h.turn(s, "").await;
    let handoff = h.turn(s, "Ask a question about ACCESS").await;
    assert_eq!(handoff.step, "go_ahead_and_ask");
    assert_eq!(handoff.next_action, NextAction::None);

    let looped = h.turn(s, "what is an allocation?").await;
    assert_eq!(looped.next_action, NextAction::QaLoop);
    assert_eq!(looped.step, "qa_loop");

    // The session is parked back at the menu afterwards.
    let back = h.turn(s, "Open a Help Ticket").await;
    assert_eq!(back.step, "help_ticket");
}
