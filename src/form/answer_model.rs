use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SKIP_MARKER: &str = "SKIP";

/// Reference to one chosen option (or one free-text value) inside an answer.
///
/// `id` is `-1` when the generator answered with a bare string rather than an
/// option record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct OptionRef {
    pub id: i64,
    pub text: String,
    #[serde(rename = "otherText", skip_serializing_if = "Option::is_none")]
    pub other_text: Option<String>,
}

/// Option records as models write them: the label may sit under `text`,
/// `answer` or both, and ids sometimes come back as strings.
impl From<Map<String, Value>> for OptionRef {
    fn from(record: Map<String, Value>) -> Self {
        let id = match record.get("id") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        let text = record
            .get("text")
            .and_then(scalar_text)
            .filter(|text| !text.is_empty())
            .or_else(|| record.get("answer").and_then(scalar_text))
            .unwrap_or_default();

        Self {
            id: id.unwrap_or(-1),
            text,
            other_text: record.get("otherText").and_then(scalar_text),
        }
    }
}

/// Text of a JSON string, number or boolean.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl OptionRef {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            other_text: None,
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(-1, text)
    }

    pub fn with_other_text(mut self, other: impl Into<String>) -> Self {
        self.other_text = Some(other.into());
        self
    }

    /// Records the generator marked as "leave this control alone".
    pub fn is_skip(&self) -> bool {
        self.text.trim() == SKIP_MARKER
    }

    pub fn position(&self) -> Option<usize> {
        usize::try_from(self.id).ok()
    }
}

/// Normalized answer payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<WireAnswer>", into = "Option<WireAnswer>")]
pub enum AnswerValue {
    #[default]
    Skip,
    Single(OptionRef),
    Multiple(Vec<OptionRef>),
}

impl AnswerValue {
    pub fn is_skip(&self) -> bool {
        matches!(self, AnswerValue::Skip)
    }

    /// Flatten into the ordered record list the replay handlers work on.
    pub fn records(&self) -> Vec<OptionRef> {
        match self {
            AnswerValue::Skip => vec![],
            AnswerValue::Single(record) => vec![record.clone()],
            AnswerValue::Multiple(records) => records.clone(),
        }
    }
}

/// The three shapes an answer may take on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireAnswer {
    Many(Vec<OptionRef>),
    One(OptionRef),
    Text(String),
    /// Numbers, booleans and lists of bare values.
    Loose(Value),
}

impl From<Option<WireAnswer>> for AnswerValue {
    fn from(raw: Option<WireAnswer>) -> Self {
        match raw {
            None => AnswerValue::Skip,
            Some(WireAnswer::Text(text)) if text.trim() == SKIP_MARKER => AnswerValue::Skip,
            Some(WireAnswer::Text(text)) => AnswerValue::Single(OptionRef::text_only(text)),
            Some(WireAnswer::One(record)) => AnswerValue::Single(record),
            Some(WireAnswer::Many(records)) => AnswerValue::Multiple(records),
            Some(WireAnswer::Loose(Value::Array(items))) => {
                let records: Vec<OptionRef> = items
                    .iter()
                    .filter_map(scalar_text)
                    .map(OptionRef::text_only)
                    .collect();
                if records.is_empty() {
                    AnswerValue::Skip
                } else {
                    AnswerValue::Multiple(records)
                }
            }
            Some(WireAnswer::Loose(value)) => scalar_text(&value)
                .map(|text| AnswerValue::Single(OptionRef::text_only(text)))
                .unwrap_or(AnswerValue::Skip),
        }
    }
}

impl From<AnswerValue> for Option<WireAnswer> {
    fn from(value: AnswerValue) -> Self {
        match value {
            AnswerValue::Skip => None,
            AnswerValue::Single(record) => Some(WireAnswer::One(record)),
            AnswerValue::Multiple(records) => Some(WireAnswer::Many(records)),
        }
    }
}

/// One proposed response for a question, keyed by the question's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "questionId")]
    pub question_id: usize,
    #[serde(default)]
    pub answer: AnswerValue,
}

impl Answer {
    pub fn skip(question_id: usize) -> Self {
        Self {
            question_id,
            answer: AnswerValue::Skip,
        }
    }

    pub fn single(question_id: usize, record: OptionRef) -> Self {
        Self {
            question_id,
            answer: AnswerValue::Single(record),
        }
    }

    pub fn multiple(question_id: usize, records: Vec<OptionRef>) -> Self {
        Self {
            question_id,
            answer: AnswerValue::Multiple(records),
        }
    }
}

/// First answer addressed to `question_id`, if any.
pub fn find_answer(answers: &[Answer], question_id: usize) -> Option<&Answer> {
    answers.iter().find(|a| a.question_id == question_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_string_becomes_unpositioned_record() {
        let answer: Answer = serde_json::from_str(r#"{"questionId":3,"answer":"Paris"}"#).unwrap();
        assert_eq!(
            answer.answer,
            AnswerValue::Single(OptionRef::text_only("Paris"))
        );
    }

    #[test]
    fn null_and_skip_string_are_skip() {
        let null: Answer = serde_json::from_str(r#"{"questionId":0,"answer":null}"#).unwrap();
        let skip: Answer = serde_json::from_str(r#"{"questionId":0,"answer":"SKIP"}"#).unwrap();
        let missing: Answer = serde_json::from_str(r#"{"questionId":0}"#).unwrap();
        assert!(null.answer.is_skip());
        assert!(skip.answer.is_skip());
        assert!(missing.answer.is_skip());
    }

    #[test]
    fn record_accepts_answer_alias_and_other_text() {
        let answer: Answer = serde_json::from_str(
            r#"{"questionId":1,"answer":{"id":4,"answer":"Other","otherText":"Kiwi"}}"#,
        )
        .unwrap();
        let records = answer.answer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 4);
        assert_eq!(records[0].text, "Other");
        assert_eq!(records[0].other_text.as_deref(), Some("Kiwi"));
    }

    #[test]
    fn record_with_both_text_and_answer_keys() {
        let answer: Answer = serde_json::from_str(
            r#"{"questionId":0,"answer":{"id":"1","text":"Blue","answer":"Blue"}}"#,
        )
        .unwrap();
        assert_eq!(answer.answer, AnswerValue::Single(OptionRef::new(1, "Blue")));
    }

    #[test]
    fn numeric_answers_become_text() {
        let number: Answer = serde_json::from_str(r#"{"questionId":1,"answer":21}"#).unwrap();
        let list: Answer =
            serde_json::from_str(r#"{"questionId":2,"answer":["Rust", 3, {"nested": true}]}"#).unwrap();

        assert_eq!(number.answer, AnswerValue::Single(OptionRef::text_only("21")));
        assert_eq!(
            list.answer,
            AnswerValue::Multiple(vec![OptionRef::text_only("Rust"), OptionRef::text_only("3")])
        );
    }

    #[test]
    fn array_becomes_multiple() {
        let answer: Answer =
            serde_json::from_str(r#"{"questionId":2,"answer":[{"id":0},{"id":2,"text":"C"}]}"#)
                .unwrap();
        match answer.answer {
            AnswerValue::Multiple(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].id, 0);
                assert_eq!(records[1].text, "C");
            }
            other => panic!("expected Multiple, got {:?}", other),
        }
    }

    #[test]
    fn skip_serializes_as_null() {
        let json = serde_json::to_string(&Answer::skip(5)).unwrap();
        assert_eq!(json, r#"{"questionId":5,"answer":null}"#);
    }
}
