use std::time::Duration;

use form_pilot::{
    dom::document::{Document, EventKind},
    extract::{discovery::Discovery, extractor::extract},
    form::answer_model::{Answer, OptionRef},
    replay::{
        replayer::{ReplayConfig, Replayer, replay},
        scheduler::ManualClock,
    },
    trace::{logger::TraceLogger, trace::Outcome},
};

use crate::common::utils::{fixture, key, keys};

mod common;

fn run(doc: &mut Document, answers: &[Answer]) -> (ManualClock, TraceLogger) {
    let mut clock = ManualClock::default();
    let tracer = TraceLogger::in_memory();
    Replayer::default().replay(doc, answers, &mut clock, &tracer);
    (clock, tracer)
}

// =========================================================================
// multiple_choice
// =========================================================================

#[test]
fn synthetic_radio_is_clicked_by_label_text() {
    let mut doc = fixture("google_form.html");
    run(&mut doc, &[Answer::single(0, OptionRef::new(1, "Blue"))]);

    let blue = key(&doc, "[role=\"radio\"][data-value=\"Blue\"]");
    assert_eq!(doc.events_for(blue), vec![EventKind::Click]);
    assert_eq!(doc.events().len(), 1);
}

#[test]
fn option_can_be_matched_by_id_alone() {
    let mut doc = fixture("google_form.html");
    let record = OptionRef {
        id: 0,
        text: String::new(),
        other_text: None,
    };
    run(&mut doc, &[Answer::single(0, record)]);

    let red = key(&doc, "[role=\"radio\"][data-value=\"Red\"]");
    assert_eq!(doc.events_for(red), vec![EventKind::Click]);
}

#[test]
fn other_option_fills_companion_text_input() {
    let mut doc = fixture("google_form.html");
    let record = OptionRef::new(2, "Other").with_other_text("Purple");
    run(&mut doc, &[Answer::single(0, record)]);

    let other = key(&doc, "[role=\"radio\"][data-value=\"Other\"]");
    let input = key(&doc, "input.other-input");
    assert_eq!(doc.events_for(other), vec![EventKind::Click]);
    assert_eq!(doc.value(input).as_deref(), Some("Purple"));
    assert_eq!(doc.events_for(input), vec![EventKind::Input]);
}

#[test]
fn native_radio_behind_label_is_checked() {
    let mut doc = fixture("google_form.html");
    run(&mut doc, &[Answer::single(6, OptionRef::new(1, "Good"))]);

    let radios = keys(&doc, "input[name=\"venue\"]");
    let checked: Vec<bool> = radios.iter().map(|k| doc.is_checked(*k)).collect();
    assert_eq!(checked, vec![false, true, false, false]);
    assert_eq!(doc.events_for(radios[1]), vec![EventKind::Change, EventKind::Input]);
}

#[test]
fn unmatched_option_is_skipped_without_events() {
    let mut doc = fixture("google_form.html");
    let (_, tracer) = run(&mut doc, &[Answer::single(0, OptionRef::text_only("Green"))]);

    assert!(doc.events().is_empty());
    assert!(
        tracer
            .events()
            .iter()
            .any(|e| e.question_id == Some(0) && e.outcome == Outcome::Skipped)
    );
}

// =========================================================================
// checkbox
// =========================================================================

#[test]
fn checkbox_selects_every_listed_option() {
    let mut doc = fixture("google_form.html");
    run(
        &mut doc,
        &[Answer::multiple(
            1,
            vec![OptionRef::new(0, "Rust"), OptionRef::new(2, "Python")],
        )],
    );

    let boxes = keys(&doc, "input[name=\"lang\"]");
    let checked: Vec<bool> = boxes.iter().map(|k| doc.is_checked(*k)).collect();
    assert_eq!(checked, vec![true, false, true]);
    assert_eq!(doc.events_for(boxes[2]), vec![EventKind::Change, EventKind::Input]);
}

#[test]
fn synthetic_checkboxes_are_clicked_by_position() {
    let mut doc = fixture("generic_form.html");
    run(&mut doc, &[Answer::multiple(0, vec![OptionRef::new(1, "Web")])]);

    let toggles = keys(&doc, "[role=\"checkbox\"]");
    assert!(doc.events_for(toggles[0]).is_empty());
    assert_eq!(doc.events_for(toggles[1]), vec![EventKind::Click]);
}

#[test]
fn skip_records_inside_a_list_are_ignored() {
    let mut doc = fixture("google_form.html");
    run(
        &mut doc,
        &[Answer::multiple(
            1,
            vec![OptionRef::text_only("SKIP"), OptionRef::new(1, "Go")],
        )],
    );

    let boxes = keys(&doc, "input[name=\"lang\"]");
    let checked: Vec<bool> = boxes.iter().map(|k| doc.is_checked(*k)).collect();
    assert_eq!(checked, vec![false, true, false]);
}

// =========================================================================
// dropdown
// =========================================================================

#[test]
fn native_select_offsets_placeholder_row() {
    let mut doc = fixture("google_form.html");
    run(&mut doc, &[Answer::single(2, OptionRef::new(1, "Medium"))]);

    let select = key(&doc, "select[name=\"size\"]");
    assert_eq!(doc.selected_index(select), Some(2));
    assert_eq!(
        doc.events_for(select),
        vec![EventKind::Focus, EventKind::Change, EventKind::Blur, EventKind::Input]
    );
}

#[test]
fn native_select_matches_text_when_id_missing() {
    let mut doc = fixture("google_form.html");
    run(&mut doc, &[Answer::single(2, OptionRef::text_only("Large"))]);

    let select = key(&doc, "select[name=\"size\"]");
    assert_eq!(doc.selected_index(select), Some(3));
}

#[test]
fn out_of_range_select_is_logged_and_left_alone() {
    let mut doc = fixture("google_form.html");
    let (_, tracer) = run(&mut doc, &[Answer::single(2, OptionRef::new(9, "Huge"))]);

    let select = key(&doc, "select[name=\"size\"]");
    assert_eq!(doc.selected_index(select), Some(0));
    assert!(doc.events().is_empty());
    assert!(
        tracer
            .events()
            .iter()
            .any(|e| e.question_id == Some(2) && e.outcome == Outcome::Failed)
    );
}

#[test]
fn custom_dropdown_opens_then_clicks_option() {
    let mut doc = fixture("google_form.html");
    let (clock, _) = run(&mut doc, &[Answer::single(5, OptionRef::new(2, "Afternoon"))]);

    let listbox = key(&doc, "[role=\"listbox\"]");
    assert_eq!(
        doc.events_for(listbox),
        vec![EventKind::Click, EventKind::MouseDown, EventKind::MouseUp]
    );

    let rows = keys(&doc, "[role=\"listbox\"] [role=\"option\"]");
    assert_eq!(
        doc.events_for(rows[2]),
        vec![
            EventKind::Click,
            EventKind::MouseDown,
            EventKind::MouseUp,
            EventKind::Change
        ]
    );
    assert_eq!(doc.focused(), Some(rows[2]));
    assert!(doc.events_for(rows[1]).is_empty());

    // control offset, then panel open delay, then option click delay
    assert_eq!(clock.elapsed, Duration::from_millis(100 + 200 + 50));
}

#[test]
fn aria_label_dropdown_clicks_labelled_child() {
    let mut doc = fixture("generic_form.html");
    run(&mut doc, &[Answer::single(1, OptionRef::new(2, "Intermediate"))]);

    let target = key(&doc, "span[title=\"Intermediate\"]");
    assert_eq!(
        doc.events_for(target),
        vec![
            EventKind::Click,
            EventKind::MouseDown,
            EventKind::MouseUp,
            EventKind::Change
        ]
    );
}

#[test]
fn dropdown_uses_only_first_record() {
    let mut doc = fixture("google_form.html");
    run(
        &mut doc,
        &[Answer::multiple(
            2,
            vec![OptionRef::new(0, "Small"), OptionRef::new(2, "Large")],
        )],
    );

    let select = key(&doc, "select[name=\"size\"]");
    assert_eq!(doc.selected_index(select), Some(1));
}

// =========================================================================
// text
// =========================================================================

#[test]
fn short_answer_and_paragraph_receive_text() {
    let mut doc = fixture("google_form.html");
    run(
        &mut doc,
        &[
            Answer::single(3, OptionRef::text_only("Ada Lovelace")),
            Answer::single(4, OptionRef::new(0, "Shipping on time")),
        ],
    );

    let name = key(&doc, "input[name=\"fullname\"]");
    let well = key(&doc, "textarea[name=\"well\"]");
    assert_eq!(doc.value(name).as_deref(), Some("Ada Lovelace"));
    assert_eq!(doc.value(well).as_deref(), Some("Shipping on time"));
    assert_eq!(doc.events_for(well), vec![EventKind::Input]);
}

#[test]
fn bare_string_answer_is_accepted() {
    let mut doc = fixture("google_form.html");
    let answers: Vec<Answer> =
        serde_json::from_str(r#"[{"questionId": 4, "answer": "Good retros"}]"#).unwrap();
    run(&mut doc, &answers);

    let well = key(&doc, "textarea[name=\"well\"]");
    assert_eq!(doc.value(well).as_deref(), Some("Good retros"));
}

#[test]
fn skip_text_in_any_case_is_not_typed() {
    let mut doc = fixture("google_form.html");
    run(
        &mut doc,
        &[
            Answer::single(3, OptionRef::text_only("skip")),
            Answer::single(4, OptionRef::text_only("   ")),
        ],
    );
    assert!(doc.events().is_empty());
}

// =========================================================================
// whole-form behavior
// =========================================================================

#[test]
fn skipped_and_missing_answers_touch_nothing() {
    let mut doc = fixture("google_form.html");
    let answers: Vec<Answer> = serde_json::from_str(
        r#"[{"questionId": 0, "answer": null},
            {"questionId": 1, "answer": "SKIP"},
            {"questionId": 2}]"#,
    )
    .unwrap();

    let (clock, tracer) = run(&mut doc, &answers);

    assert!(doc.events().is_empty());
    assert!(doc.touched_controls().is_empty());
    assert_eq!(clock.elapsed, Duration::ZERO);
    let skipped = tracer
        .events()
        .iter()
        .filter(|e| e.outcome == Outcome::Skipped)
        .count();
    assert_eq!(skipped, 8);
}

#[test]
fn unknown_questions_are_passed_over() {
    let mut doc = fixture("google_form.html");
    let (_, tracer) = run(&mut doc, &[Answer::single(7, OptionRef::text_only("Anything"))]);

    assert!(doc.events().is_empty());
    let event = tracer
        .events()
        .into_iter()
        .find(|e| e.question_id == Some(7))
        .unwrap();
    assert_eq!(event.outcome, Outcome::Skipped);
}

#[test]
fn one_failing_control_does_not_block_the_rest() {
    let mut doc = fixture("google_form.html");
    run(
        &mut doc,
        &[
            Answer::single(2, OptionRef::new(42, "Nope")),
            Answer::single(4, OptionRef::text_only("Still typed")),
        ],
    );

    let well = key(&doc, "textarea[name=\"well\"]");
    assert_eq!(doc.value(well).as_deref(), Some("Still typed"));
}

#[test]
fn full_form_round_trip_through_extraction() {
    let mut doc = fixture("google_form.html");
    let snapshot = extract(&doc);
    let answers: Vec<Answer> = snapshot
        .questions
        .iter()
        .filter(|q| q.question_type.has_options())
        .map(|q| {
            let last = q.options.last().unwrap();
            Answer::single(q.id, OptionRef::new(last.id as i64, &last.text))
        })
        .collect();

    replay(&mut doc, &answers);

    let select = key(&doc, "select[name=\"size\"]");
    let venue = keys(&doc, "input[name=\"venue\"]");
    let lang = keys(&doc, "input[name=\"lang\"]");
    let rows = keys(&doc, "[role=\"listbox\"] [role=\"option\"]");
    let other = key(&doc, "[role=\"radio\"][data-value=\"Other\"]");

    assert_eq!(doc.selected_index(select), Some(3));
    assert!(doc.is_checked(venue[3]));
    assert!(doc.is_checked(lang[2]));
    assert!(doc.events_for(rows[3]).contains(&EventKind::Click));
    assert_eq!(doc.events_for(other), vec![EventKind::Click]);
}

#[test]
fn custom_delays_are_honored() {
    let mut doc = fixture("google_form.html");
    let config = ReplayConfig {
        control_delay: Duration::from_millis(10),
        dropdown_open_delay: Duration::from_millis(20),
        option_click_delay: Duration::from_millis(5),
    };
    let mut clock = ManualClock::default();
    Replayer::new(Discovery::standard(), config).replay(
        &mut doc,
        &[Answer::single(5, OptionRef::new(1, "Morning"))],
        &mut clock,
        &TraceLogger::disabled(),
    );

    assert_eq!(clock.elapsed, Duration::from_millis(35));
}
