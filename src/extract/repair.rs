//! Passes that run after every container has been classified once.

use scraper::ElementRef;

use crate::dom::document::{Document, is_ancestor_of, text_content};
use crate::dom::selectors::{DROPDOWN_CONTROL, LISTBOX_OPTION};
use crate::extract::options::{listbox_options, native_select_options};
use crate::form::form_model::{Question, QuestionType};
use crate::form::normalize::{has_numbered_item, has_rating_scale, rating_options_present};

/// Promote numbered `unknown` questions whose container carries the rating
/// vocabulary. A grid row may also borrow it from a wrapper that holds no other
/// question, such as a shared scale header. Returns the ids that changed.
pub fn promote_rating_scales(containers: &[ElementRef<'_>], questions: &mut [Question]) -> Vec<usize> {
    let mut promoted = Vec::new();

    for question in questions.iter_mut() {
        if question.question_type != QuestionType::Unknown || !has_numbered_item(&question.text) {
            continue;
        }
        let Some(container) = containers.get(question.id) else {
            continue;
        };

        let own_text = text_content(*container);
        let full_text = if has_rating_scale(&own_text) {
            own_text
        } else {
            match private_section(containers, *container) {
                Some(section) => text_content(section),
                None => continue,
            }
        };
        if has_rating_scale(&full_text) {
            question.question_type = QuestionType::MultipleChoice;
            if question.options.is_empty() {
                question.options = rating_options_present(&full_text);
            }
            promoted.push(question.id);
        }
    }

    promoted
}

/// Parent of `container`, unless it also wraps another discovered container.
fn private_section<'a>(containers: &[ElementRef<'a>], container: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let parent = container.parent().and_then(ElementRef::wrap)?;
    let shared = containers
        .iter()
        .any(|other| *other != container && is_ancestor_of(parent, *other));
    (!shared).then_some(parent)
}

/// Index of the discovered container holding `el`.
pub fn owning_container(containers: &[ElementRef<'_>], el: ElementRef<'_>) -> Option<usize> {
    containers
        .iter()
        .position(|container| *container == el || is_ancestor_of(*container, el))
}

/// Force every question that owns a listbox or select to `dropdown`, backfilling
/// options from that control when the question has none. Returns the ids that changed.
pub fn force_dropdowns(
    doc: &Document,
    containers: &[ElementRef<'_>],
    questions: &mut [Question],
) -> Vec<usize> {
    let mut forced = Vec::new();

    for control in doc.select_all(&DROPDOWN_CONTROL) {
        let Some(index) = owning_container(containers, control) else {
            continue;
        };
        let Some(question) = questions.get_mut(index) else {
            continue;
        };
        if question.question_type == QuestionType::Dropdown {
            continue;
        }

        question.question_type = QuestionType::Dropdown;
        if question.options.is_empty() {
            question.options = if control.value().name() == "select" {
                native_select_options(control)
            } else {
                listbox_options(control, &LISTBOX_OPTION)
            };
        }
        forced.push(index);
    }

    forced
}
