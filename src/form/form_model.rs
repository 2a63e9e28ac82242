use serde::{Deserialize, Serialize};

/// Control-type taxonomy inferred for one question container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Checkbox,
    Dropdown,
    ShortAnswer,
    Paragraph,
    Unknown,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Dropdown => "dropdown",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::Paragraph => "paragraph",
            QuestionType::Unknown => "unknown",
        }
    }

    /// Types whose answers are picked from an option list.
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice | QuestionType::Checkbox | QuestionType::Dropdown
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self, QuestionType::ShortAnswer | QuestionType::Paragraph)
    }
}

/// One selectable choice within a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOption {
    pub id: usize,
    pub text: String,
}

impl FormOption {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// One inferred form field.
///
/// `id` is the zero-based position of the question container in document order.
/// It is the only join key between a question and its answer and is valid only
/// for one extraction/replay pair against an unchanged document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub required: bool,
    pub options: Vec<FormOption>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Result of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

pub const ERROR_SNAPSHOT_TITLE: &str = "Error extracting form";

impl FormSnapshot {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            questions: vec![],
        }
    }

    /// Snapshot returned when the extraction walk fails. Never carries questions.
    pub fn error(detail: impl ToString) -> Self {
        Self {
            title: ERROR_SNAPSHOT_TITLE.to_string(),
            description: detail.to_string(),
            questions: vec![],
        }
    }

    pub fn is_error(&self) -> bool {
        self.title == ERROR_SNAPSHOT_TITLE && self.questions.is_empty()
    }

    pub fn question(&self, id: usize) -> Option<&Question> {
        self.questions.get(id).filter(|q| q.id == id)
    }
}
