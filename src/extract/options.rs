use scraper::{ElementRef, Selector};

use crate::dom::document::trimmed_text;
use crate::dom::selectors::{CUSTOM_DROPDOWN_OPTION, LISTBOX, NATIVE_SELECT, SELECT_OPTION};
use crate::form::classifier::{Classification, choice_options};
use crate::form::form_model::{FormOption, QuestionType};
use crate::form::normalize::{CHOOSE_PLACEHOLDER, aria_label_candidates};

/// Option list for a classified container.
pub fn harvest_options(container: ElementRef<'_>, classification: &Classification) -> Vec<FormOption> {
    if let Some(rating) = &classification.rating_options {
        return rating.clone();
    }

    match classification.question_type {
        QuestionType::MultipleChoice | QuestionType::Checkbox => choice_options(container)
            .into_iter()
            .map(|(option, _)| option)
            .collect(),
        QuestionType::Dropdown => dropdown_options(container),
        QuestionType::ShortAnswer | QuestionType::Paragraph | QuestionType::Unknown => vec![],
    }
}

/// Native select first, then custom listbox rows, then the listbox aria-label.
pub fn dropdown_options(container: ElementRef<'_>) -> Vec<FormOption> {
    if let Some(select) = container.select(&NATIVE_SELECT).next() {
        let options = native_select_options(select);
        if !options.is_empty() {
            return options;
        }
    }

    let options = listbox_options(container, &CUSTOM_DROPDOWN_OPTION);
    if !options.is_empty() {
        return options;
    }

    container
        .select(&LISTBOX)
        .next()
        .map(aria_label_options)
        .unwrap_or_default()
}

/// Rows of a native select. Row 0 is the placeholder, so `id = row - 1`.
pub fn native_select_options(select: ElementRef<'_>) -> Vec<FormOption> {
    select
        .select(&SELECT_OPTION)
        .enumerate()
        .skip(1)
        .map(|(row, option)| FormOption::new(row - 1, trimmed_text(option)))
        .collect()
}

/// Rows of a custom listbox. The id is the row's raw position, placeholder
/// row included, because replay clicks the opened list by that same position.
pub fn listbox_options(scope: ElementRef<'_>, rows: &Selector) -> Vec<FormOption> {
    let mut options: Vec<FormOption> = Vec::new();
    for (row, option) in scope.select(rows).enumerate() {
        let text = trimmed_text(option);
        if text.is_empty() || text == CHOOSE_PLACEHOLDER || options.iter().any(|o| o.text == text) {
            continue;
        }
        options.push(FormOption::new(row, text));
    }
    options
}

/// Options packed into a listbox's comma-separated aria-label.
pub fn aria_label_options(listbox: ElementRef<'_>) -> Vec<FormOption> {
    let Some(label) = listbox.value().attr("aria-label") else {
        return vec![];
    };

    let mut options: Vec<FormOption> = Vec::new();
    for (position, candidate) in aria_label_candidates(label).into_iter().enumerate() {
        if let Some(text) = candidate {
            if !options.iter().any(|o| o.text == text) {
                options.push(FormOption::new(position, text));
            }
        }
    }
    options
}
