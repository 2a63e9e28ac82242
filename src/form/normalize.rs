use once_cell::sync::Lazy;
use regex::Regex;

use crate::form::form_model::{FormOption, FormSnapshot};

/// Rating vocabulary in the fixed order the synthetic options use.
pub const RATING_WORDS: [&str; 5] = ["Excellent", "Good", "Average", "Poor", "Very Poor"];

/// Placeholder row label of custom dropdowns.
pub const CHOOSE_PLACEHOLDER: &str = "Choose";

static NUMBERED_QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\.\s+(.*?)(?:Excellent|Good|Average|Poor|Very Poor|\*)")
        .expect("numbered question pattern")
});

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.").expect("numbered item pattern"));

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used to deduplicate option labels within one question.
pub fn option_key(text: &str) -> String {
    collapse_whitespace(text)
}

/// Label text as compared against answer text during replay.
pub fn toggle_label(text: &str) -> String {
    text.trim().replace(':', "")
}

/// True when the text mentions the four core rating words.
pub fn has_rating_scale(text: &str) -> bool {
    RATING_WORDS[..4].iter().all(|word| text.contains(word))
}

/// Synthetic rating options, "Very Poor" only when present.
pub fn rating_options(text: &str) -> Vec<FormOption> {
    let mut words: Vec<&str> = RATING_WORDS[..4].to_vec();
    if text.contains(RATING_WORDS[4]) {
        words.push(RATING_WORDS[4]);
    }
    words
        .into_iter()
        .enumerate()
        .map(|(id, word)| FormOption::new(id, word))
        .collect()
}

/// Rating options backfilled by the repair pass: every vocabulary word present,
/// keeping its position in the vocabulary as the id.
pub fn rating_options_present(text: &str) -> Vec<FormOption> {
    RATING_WORDS
        .iter()
        .enumerate()
        .filter(|(_, word)| text.contains(*word))
        .map(|(id, word)| FormOption::new(id, *word))
        .collect()
}

pub fn has_numbered_item(text: &str) -> bool {
    NUMBERED_ITEM.is_match(text)
}

/// Best-effort label for a container without a title element.
pub fn guess_question_text(full_text: &str, index: usize) -> String {
    NUMBERED_QUESTION
        .captures(full_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| placeholder_text(index))
}

pub fn placeholder_text(index: usize) -> String {
    format!("Question {}", index + 1)
}

/// Split a comma-bearing aria-label into candidate option labels.
/// Positions are preserved; excluded candidates come back as `None`.
pub fn aria_label_candidates(label: &str) -> Vec<Option<String>> {
    if !label.contains(',') {
        return vec![];
    }
    label
        .split(',')
        .map(|part| part.trim())
        .map(|part| {
            if part.is_empty() || part.contains(CHOOSE_PLACEHOLDER) {
                None
            } else {
                Some(part.to_string())
            }
        })
        .collect()
}

/// Structural fingerprint of a snapshot: question ids, types and option lists.
pub fn snapshot_fingerprint(snapshot: &FormSnapshot) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    for question in &snapshot.questions {
        hasher.update(format!("{}:{}|", question.id, question.question_type.as_str()));
        for option in &question.options {
            hasher.update(format!("{}={};", option.id, option.text));
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
