use scraper::ElementRef;

use crate::dom::document::{text_content, trimmed_text};
use crate::dom::selectors::{
    CHECKBOX, DROPDOWN_MARKER, FALLBACK_OPTION_LABEL, OPTION_LABEL, RADIO, SELECT_LIKE,
    TEXT_INPUT,
};
use crate::form::form_model::{FormOption, QuestionType};
use crate::form::normalize::{has_rating_scale, option_key, rating_options};

/// Outcome of the shared classification cascade for one container.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub question_type: QuestionType,
    /// Synthetic options when the rating-scale rule fired.
    pub rating_options: Option<Vec<FormOption>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlCounts {
    pub radio: usize,
    pub checkbox: usize,
    pub text: usize,
    pub select: usize,
    pub dropdown_marker: bool,
    pub first_text_is_textarea: bool,
}

pub fn count_controls(container: ElementRef<'_>) -> ControlCounts {
    let first_text = container.select(&TEXT_INPUT).next();
    ControlCounts {
        radio: container.select(&RADIO).count(),
        checkbox: container.select(&CHECKBOX).count(),
        text: container.select(&TEXT_INPUT).count(),
        select: container.select(&SELECT_LIKE).count(),
        dropdown_marker: container.select(&DROPDOWN_MARKER).next().is_some(),
        first_text_is_textarea: first_text.is_some_and(|el| el.value().name() == "textarea"),
    }
}

/// Radio wins over checkbox, checkbox over dropdown, dropdown over text.
pub fn type_from_counts(counts: &ControlCounts) -> QuestionType {
    if counts.radio > 0 {
        QuestionType::MultipleChoice
    } else if counts.checkbox > 0 {
        QuestionType::Checkbox
    } else if counts.select > 0 || counts.dropdown_marker {
        QuestionType::Dropdown
    } else if counts.text > 0 {
        if counts.first_text_is_textarea {
            QuestionType::Paragraph
        } else {
            QuestionType::ShortAnswer
        }
    } else {
        QuestionType::Unknown
    }
}

/// Classify one question container. Pure: the same subtree always yields the
/// same result, which is what lets replay rediscover extraction's indexing.
pub fn classify_container(container: ElementRef<'_>) -> Classification {
    let full_text = text_content(container);

    if has_rating_scale(&full_text) {
        return Classification {
            question_type: QuestionType::MultipleChoice,
            rating_options: Some(rating_options(&full_text)),
        };
    }

    Classification {
        question_type: type_from_counts(&count_controls(container)),
        rating_options: None,
    }
}

/// Labelled toggles of a choice question paired with the option they produce.
///
/// Ids are assigned after deduplication so they stay contiguous; replay walks the
/// same list, so option `n` always addresses the same label node in both passes.
pub fn choice_options<'a>(container: ElementRef<'a>) -> Vec<(FormOption, ElementRef<'a>)> {
    let mut labels: Vec<ElementRef<'a>> = container.select(&OPTION_LABEL).collect();
    if labels.is_empty() {
        labels = container.select(&FALLBACK_OPTION_LABEL).collect();
    }

    let mut seen: Vec<String> = Vec::new();
    let mut options = Vec::new();
    for label in labels {
        let text = trimmed_text(label);
        if text.is_empty() {
            continue;
        }
        let key = option_key(&text);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        options.push((FormOption::new(options.len(), text), label));
    }
    options
}
