use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::form::answer_model::Answer;
use crate::form::error::FormError;
use crate::form::form_model::FormSnapshot;
use crate::form::normalize::snapshot_fingerprint;

/// What is remembered about the form currently being worked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub form_data: FormSnapshot,
    pub answers: Vec<Answer>,
    pub current_form_url: Option<String>,
    pub timestamp_ms: u128,
    pub fingerprint: String,
}

/// Single-entry, in-memory cache of the last scanned form and its answers.
#[derive(Debug, Default)]
pub struct SessionCache {
    entry: Option<SessionEntry>,
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self) -> Option<&SessionEntry> {
        self.entry.as_ref()
    }

    /// The cached entry, only if it was scanned from `url`.
    pub fn entry_for(&self, url: &str) -> Option<&SessionEntry> {
        self.entry
            .as_ref()
            .filter(|entry| entry.current_form_url.as_deref() == Some(url))
    }

    /// Replace the cached form. Answers survive only when the same form
    /// (same address and structure) is stored again.
    pub fn store_form(&mut self, url: Option<&str>, snapshot: FormSnapshot) {
        let fingerprint = snapshot_fingerprint(&snapshot);
        let url = url.map(str::to_string);

        let answers = match self.entry.take() {
            Some(old) if old.fingerprint == fingerprint && old.current_form_url == url => old.answers,
            _ => vec![],
        };

        self.entry = Some(SessionEntry {
            form_data: snapshot,
            answers,
            current_form_url: url,
            timestamp_ms: now_ms(),
            fingerprint,
        });
    }

    pub fn store_answers(&mut self, answers: Vec<Answer>) -> Result<(), FormError> {
        let entry = self
            .entry
            .as_mut()
            .ok_or_else(|| FormError::Generator("no form scanned yet".into()))?;
        entry.answers = answers;
        entry.timestamp_ms = now_ms();
        Ok(())
    }

    pub fn clear_answers(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            entry.answers.clear();
        }
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::form_model::{FormOption, Question, QuestionType};

    fn snapshot(option: &str) -> FormSnapshot {
        FormSnapshot {
            title: "T".into(),
            description: String::new(),
            questions: vec![Question {
                id: 0,
                text: "Pick".into(),
                question_type: QuestionType::MultipleChoice,
                required: false,
                options: vec![FormOption::new(0, option)],
                image: None,
            }],
        }
    }

    #[test]
    fn answers_survive_rescan_of_same_form_only() {
        let mut cache = SessionCache::new();
        cache.store_form(Some("https://forms.gle/a"), snapshot("Yes"));
        cache.store_answers(vec![Answer::skip(0)]).unwrap();

        cache.store_form(Some("https://forms.gle/a"), snapshot("Yes"));
        assert_eq!(cache.entry().unwrap().answers.len(), 1);

        cache.store_form(Some("https://forms.gle/a"), snapshot("No"));
        assert!(cache.entry().unwrap().answers.is_empty());
    }

    #[test]
    fn entry_for_checks_url() {
        let mut cache = SessionCache::new();
        cache.store_form(Some("https://forms.gle/a"), snapshot("Yes"));

        assert!(cache.entry_for("https://forms.gle/a").is_some());
        assert!(cache.entry_for("https://forms.gle/b").is_none());

        cache.clear();
        assert!(cache.entry().is_none());
    }

    #[test]
    fn storing_answers_needs_a_form() {
        let mut cache = SessionCache::new();
        assert!(cache.store_answers(vec![]).is_err());
    }
}
