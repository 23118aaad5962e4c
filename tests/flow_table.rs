use supportbot::flow::scenarios::build_flow_table;
use supportbot::flow::rt::step::{InputMode, Next, StepOptions, QA_LOOP, START};

#[test]
fn table_builds_without_collisions() {
    let table = build_flow_table().expect("merged table must build");
    assert!(table.len() >= 40, "expected the full step set, got {}", table.len());
    assert!(table.contains(START));
    assert!(table.contains("help_ticket"));
    assert!(table.contains("access_help"));
    assert!(table.contains("resource_help"));
    assert!(table.contains("general_help_summary_subject"));
    assert!(table.contains("security_incident"));
    assert!(table.contains("metrics_intro"));
}

#[test]
fn literal_targets_all_resolve() {
    let table = build_flow_table().unwrap();
    for (id, step) in table.iter() {
        if let Next::Goto(target) = &step.next {
            assert!(
                table.contains(target) || *target == QA_LOOP,
                "step {} routes to missing step {}",
                id,
                target
            );
        }
    }
}

#[test]
fn input_modes_follow_the_controls() {
    let table = build_flow_table().unwrap();

    // Option steps lock typing out.
    let identity = table.get("access_login_identity").unwrap();
    assert_eq!(identity.input_mode, Some(InputMode::ButtonsOnly));

    // Free-text steps keep it enabled.
    let description = table.get("access_login_description").unwrap();
    assert_eq!(description.input_mode, Some(InputMode::TextEnabled));

    // Checkbox steps behave like option steps.
    let keywords = table.get("general_help_keywords").unwrap();
    assert_eq!(keywords.input_mode, Some(InputMode::ButtonsOnly));

    // The metrics loop shows feedback buttons yet accepts questions.
    let metrics = table.get("metrics_loop").unwrap();
    assert_eq!(metrics.input_mode, Some(InputMode::TextEnabled));

    // Computed options defer the derivation to render time.
    let contact_check = table.get("security_contact_check").unwrap();
    assert!(matches!(contact_check.options, StepOptions::Computed(_)));
    assert_eq!(contact_check.input_mode, None);
}

#[test]
fn upload_steps_request_the_file_control() {
    let table = build_flow_table().unwrap();
    for id in ["access_login_upload", "resource_login_upload", "general_help_upload", "security_upload"] {
        assert!(table.get(id).unwrap().upload, "{} should show the upload control", id);
    }
    assert!(!table.get("access_login_email").unwrap().upload);
}

#[test]
fn keyword_checkboxes_cap_the_selection() {
    let table = build_flow_table().unwrap();
    let step = table.get("general_help_keywords").unwrap();
    let boxes = step.checkboxes.as_ref().unwrap();
    assert_eq!(boxes.min, 0);
    assert_eq!(boxes.max, 5);
    assert!(boxes.items.len() > 250);
    assert_eq!(
        boxes.items.last().map(String::as_str),
        Some("I don't see a relevant keyword")
    );
}
