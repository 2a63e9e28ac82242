use form_pilot::{
    dom::document::{Document, EventKind},
    extract::extractor::Extractor,
    form::{error::FormError, form_model::FormSnapshot},
    generator::answer_generator::{AnswerGenerator, LlmAnswerGenerator},
    replay::{replayer::Replayer, scheduler::ManualClock},
    screen::trigger::should_extract,
    session::pipeline::FormPilot,
    trace::logger::TraceLogger,
};

use crate::common::utils::{fixture, key, keys};

mod common;

const FORM_URL: &str = "https://docs.google.com/forms/d/e/abc/viewform";

#[test]
fn scan_generate_fill_with_mock_generator() {
    let mut pilot = FormPilot::with_mock();
    let mut doc = fixture("google_form.html");

    let snapshot = pilot.scan(Some(FORM_URL), &doc).unwrap();
    assert_eq!(snapshot.questions.len(), 8);
    assert!(pilot.cache().entry_for(FORM_URL).is_some());

    let answers = pilot.generate().unwrap();
    assert_eq!(pilot.cache().entry().unwrap().answers, answers);

    pilot.fill(&mut doc, &mut ManualClock::default()).unwrap();

    let select = key(&doc, "select[name=\"size\"]");
    let lang = keys(&doc, "input[name=\"lang\"]");
    let well = key(&doc, "textarea[name=\"well\"]");
    let name = key(&doc, "input[name=\"fullname\"]");

    assert_eq!(doc.selected_index(select), Some(1));
    assert!(doc.is_checked(lang[0]));
    assert_eq!(doc.value(well).as_deref(), Some("No comment"));
    // personal question stays blank
    assert!(doc.events_for(name).is_empty());
}

#[test]
fn scan_refuses_pages_without_forms() {
    let mut pilot = FormPilot::with_mock();
    let doc = fixture("no_form.html");

    assert!(!should_extract(Some("https://example.com/blog"), &doc));
    let err = pilot.scan(Some("https://example.com/blog"), &doc).unwrap_err();
    assert!(matches!(err, FormError::Discovery(_)));
    assert!(pilot.cache().entry().is_none());
}

#[test]
fn form_url_alone_is_enough_to_scan() {
    let mut pilot = FormPilot::with_mock();
    let doc = fixture("no_form.html");

    let snapshot = pilot.scan(Some("https://forms.gle/xyz"), &doc).unwrap();
    assert!(snapshot.questions.is_empty());
    // nothing worth caching
    assert!(pilot.cache().entry().is_none());
}

#[test]
fn generate_without_scan_reports_no_questions() {
    let mut pilot = FormPilot::with_mock();
    let err = pilot.generate().unwrap_err();
    assert!(err.to_string().contains("No form questions found"));
}

#[test]
fn failed_generation_clears_previous_answers() {
    let mut pilot = FormPilot::new(
        Extractor::default(),
        Box::new(LlmAnswerGenerator::with_mock_response("not json at all")),
        Replayer::default(),
        TraceLogger::disabled(),
    );
    let doc = fixture("google_form.html");
    pilot.scan(Some(FORM_URL), &doc).unwrap();

    // prose without question markers parses to all-skip answers
    let answers = pilot.generate().unwrap();
    assert!(answers.iter().all(|a| a.answer.is_skip()));

    struct Exhausted;
    impl AnswerGenerator for Exhausted {
        fn generate(
            &self,
            _snapshot: &FormSnapshot,
            _tracer: &TraceLogger,
        ) -> Result<Vec<form_pilot::form::answer_model::Answer>, FormError> {
            Err(FormError::Generator("quota exceeded".into()))
        }
    }

    let mut pilot = FormPilot::new(
        Extractor::default(),
        Box::new(Exhausted),
        Replayer::default(),
        TraceLogger::disabled(),
    );
    pilot.scan(Some(FORM_URL), &doc).unwrap();
    pilot
        .cache_mut()
        .store_answers(answers)
        .unwrap();

    let err = pilot.generate().unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
    assert!(pilot.cache().entry().unwrap().answers.is_empty());
}

#[test]
fn fill_refuses_changed_form() {
    let mut pilot = FormPilot::with_mock();
    let doc = fixture("google_form.html");
    pilot.scan(Some(FORM_URL), &doc).unwrap();
    pilot.generate().unwrap();

    let mut other = fixture("legacy_form.html");
    let err = pilot.fill(&mut other, &mut ManualClock::default()).unwrap_err();

    assert!(matches!(err, FormError::StaleSnapshot { .. }));
    assert!(other.events().is_empty());
}

#[test]
fn fill_without_answers_is_an_error() {
    let mut pilot = FormPilot::with_mock();
    let mut doc = fixture("google_form.html");
    pilot.scan(Some(FORM_URL), &doc).unwrap();

    assert!(pilot.fill(&mut doc, &mut ManualClock::default()).is_err());
    assert!(doc.events().is_empty());
}

#[test]
fn rescanning_same_form_keeps_answers() {
    let mut pilot = FormPilot::with_mock();
    let doc = fixture("google_form.html");
    pilot.scan(Some(FORM_URL), &doc).unwrap();
    pilot.generate().unwrap();

    pilot.scan(Some(FORM_URL), &doc).unwrap();
    assert_eq!(pilot.cache().entry().unwrap().answers.len(), 8);

    let generic = fixture("generic_form.html");
    pilot.scan(Some(FORM_URL), &generic).unwrap();
    assert!(pilot.cache().entry().unwrap().answers.is_empty());
}

#[test]
fn replay_events_are_visible_on_document() {
    let mut pilot = FormPilot::with_mock();
    let mut doc = Document::parse(
        r#"<form><div role="list">
             <div role="listitem"><div role="heading">Pick</div>
               <label><input type="radio" name="p" value="a"><span>Alpha</span></label>
               <label><input type="radio" name="p" value="b"><span>Beta</span></label>
             </div>
           </div></form>"#,
    );
    pilot.scan(None, &doc).unwrap();
    pilot.generate().unwrap();
    pilot.fill(&mut doc, &mut ManualClock::default()).unwrap();

    let radios = keys(&doc, "input[name=\"p\"]");
    assert!(doc.is_checked(radios[0]));
    assert_eq!(doc.events_for(radios[0]), vec![EventKind::Change, EventKind::Input]);
}
