use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::form::form_model::QuestionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Extract,
    Generate,
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Info,
    Scheduled,
    Applied,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub phase: Phase,
    pub step: String,
    pub outcome: Outcome,

    pub question_id: Option<usize>,
    pub question_type: Option<QuestionType>,

    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(phase: Phase, step: impl ToString, outcome: Outcome) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            phase,
            step: step.to_string(),
            outcome,
            question_id: None,
            question_type: None,
            detail: None,
        }
    }

    pub fn with_question(mut self, id: usize) -> Self {
        self.question_id = Some(id);
        self
    }

    pub fn with_type(mut self, question_type: QuestionType) -> Self {
        self.question_type = Some(question_type);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
