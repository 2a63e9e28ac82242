use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::form::answer_model::{Answer, OptionRef, SKIP_MARKER};
use crate::form::error::FormError;
use crate::form::form_model::{FormSnapshot, Question, QuestionType};
use crate::generator::backend::{MockTextInference, TextInference};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Outcome, Phase, TraceEvent};

// ============================================================================
// AnswerGenerator trait
// ============================================================================

/// Proposes one answer per question of a snapshot.
pub trait AnswerGenerator {
    fn generate(&self, snapshot: &FormSnapshot, tracer: &TraceLogger) -> Result<Vec<Answer>, FormError>;
}

pub const NO_QUESTIONS: &str = "No form questions found";

/// Words that mark a question as asking for personal information.
const PERSONAL_HINTS: [&str; 9] = [
    "name", "address", "phone", "email", "e-mail", "birth", "age", "contact", "student id",
];

pub fn is_personal(text: &str) -> bool {
    let lower = text.to_lowercase();
    PERSONAL_HINTS.iter().any(|hint| {
        lower
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .any(|word| word == *hint)
            || (hint.contains(' ') && lower.contains(hint))
    })
}

// ============================================================================
// Response parsing
// ============================================================================

static JSON_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\s*\{.+\}\s*\]").expect("valid JSON array pattern"));

/// Where a parsed answer list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Json,
    Fallback,
    Unparsed,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Json => "json",
            AnswerSource::Fallback => "fallback",
            AnswerSource::Unparsed => "unparsed",
        }
    }
}

/// A model reply turned into answers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub answers: Vec<Answer>,
    pub source: AnswerSource,
    /// Array entries that could not be read as answers, with the reason.
    pub rejected: Vec<String>,
}

/// Parse a model reply into answers.
///
/// Entries of the first bracketed JSON array are read one by one, so a
/// malformed entry only loses itself. Without a usable array, each question is
/// looked up with a `Question N ... answer: "..."` pattern instead.
pub fn parse_answers(text: &str, questions: &[Question]) -> ParsedReply {
    let mut rejected = Vec::new();

    if let Some(found) = JSON_ARRAY.find(text) {
        if let Ok(entries) = serde_json::from_str::<Vec<Value>>(found.as_str()) {
            let mut answers = Vec::with_capacity(entries.len());
            for (position, entry) in entries.into_iter().enumerate() {
                match serde_json::from_value::<Answer>(entry) {
                    Ok(answer) => answers.push(answer),
                    Err(e) => rejected.push(format!("entry {}: {}", position, e)),
                }
            }
            if !answers.is_empty() {
                return ParsedReply {
                    answers,
                    source: AnswerSource::Json,
                    rejected,
                };
            }
        }
    }

    match fallback_answers(text, questions) {
        Ok(answers) => ParsedReply {
            answers,
            source: AnswerSource::Fallback,
            rejected,
        },
        Err(_) => ParsedReply {
            answers: questions.iter().map(|q| Answer::skip(q.id)).collect(),
            source: AnswerSource::Unparsed,
            rejected,
        },
    }
}

fn fallback_answers(text: &str, questions: &[Question]) -> Result<Vec<Answer>, regex::Error> {
    let mut answers = Vec::with_capacity(questions.len());

    for (index, question) in questions.iter().enumerate() {
        let pattern = Regex::new(&format!(
            r#"(?is)Question\s*{}.*?answer\s*:.*?["\[]([^"\]]+)["\]]"#,
            index + 1
        ))?;

        let answer = match pattern.captures(text).and_then(|c| c.get(1)) {
            Some(found) => answer_from_text(question, found.as_str().trim()),
            None => Answer::skip(question.id),
        };
        answers.push(answer);
    }

    Ok(answers)
}

fn answer_from_text(question: &Question, text: &str) -> Answer {
    if text == SKIP_MARKER || text.contains("personal") {
        return Answer::skip(question.id);
    }
    if question.question_type.is_text() {
        return Answer::single(question.id, OptionRef::new(0, text));
    }

    let wanted = text.to_lowercase();
    question
        .options
        .iter()
        .find(|option| {
            let have = option.text.to_lowercase();
            have.contains(&wanted) || wanted.contains(&have)
        })
        .map(|option| Answer::single(question.id, OptionRef::new(option.id as i64, &option.text)))
        .unwrap_or_else(|| Answer::skip(question.id))
}

// ============================================================================
// LlmAnswerGenerator: prompts a model through TextInference
// ============================================================================

pub struct LlmAnswerGenerator {
    backend: Box<dyn TextInference>,
}

impl LlmAnswerGenerator {
    pub fn new(backend: Box<dyn TextInference>) -> Self {
        Self { backend }
    }

    /// Generator backed by a canned model reply.
    pub fn with_mock_response(response: &str) -> Self {
        Self::new(Box::new(MockTextInference::new(response)))
    }

    pub fn build_prompt(snapshot: &FormSnapshot) -> Result<String, FormError> {
        let questions = snapshot
            .questions
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FormError::JsonSerialize {
                context: "question for prompt".into(),
                source: e,
            })?
            .join("\n");

        Ok(format!(
            r#"You are an AI assistant helping to fill out a form with the following structure:

Title: {title}
Description: {description}

For each question, provide an appropriate answer. Only answer objective questions that do not require personal information. For any question asking for personal information (name, address, phone, email, specific personal experiences), respond with "SKIP" so it is left blank.

For multiple choice, checkbox, or dropdown questions, only select from the available options.

Provide your answers in a structured format like this:
[
  {{ "questionId": 0, "answer": {{"id": 2, "answer": "Option text"}} }},
  {{ "questionId": 1, "answer": [{{"id": 0, "answer": "Option 1"}}, {{"id": 2, "answer": "Option 3"}}] }},
  {{ "questionId": 2, "answer": {{"id": 5, "answer": "Other", "otherText": "Custom answer text"}} }}
]

Here are the questions:
{questions}

Remember:
1. Skip any personal questions (respond with "SKIP")
2. For multiple choice/dropdown, return {{"id": optionId, "answer": "option text"}}
3. For checkbox questions, return an array of {{"id": optionId, "answer": "option text"}} objects
4. For short answer or paragraph, return just the text string
5. Use the exact option IDs and text from the provided options
6. If you select "Other" option, add "otherText" field with your custom text: {{"id": otherId, "answer": "Other", "otherText": "your custom answer"}}
7. Format your response as a JSON array with questionId and answer fields
"#,
            title = snapshot.title,
            description = snapshot.description,
            questions = questions,
        ))
    }
}

impl AnswerGenerator for LlmAnswerGenerator {
    fn generate(&self, snapshot: &FormSnapshot, tracer: &TraceLogger) -> Result<Vec<Answer>, FormError> {
        if snapshot.questions.is_empty() {
            return Err(FormError::Generator(NO_QUESTIONS.into()));
        }

        let prompt = Self::build_prompt(snapshot)?;
        let reply = self.backend.infer_text(&prompt)?;
        let parsed = parse_answers(&reply, &snapshot.questions);

        for reason in &parsed.rejected {
            tracer.log(
                TraceEvent::now(Phase::Generate, "parse_entry", Outcome::Skipped).with_detail(reason),
            );
        }

        let outcome = match parsed.source {
            AnswerSource::Unparsed => Outcome::Failed,
            _ => Outcome::Applied,
        };
        tracer.log(
            TraceEvent::now(Phase::Generate, "parse_answers", outcome).with_detail(format!(
                "source={} answers={} rejected={}",
                parsed.source.as_str(),
                parsed.answers.len(),
                parsed.rejected.len()
            )),
        );

        Ok(parsed.answers)
    }
}

// ============================================================================
// MockAnswerGenerator: deterministic, rule-based (for testing without a model)
// ============================================================================

/// Picks the first option of every choice question and skips personal ones.
pub struct MockAnswerGenerator;

pub const MOCK_TEXT_ANSWER: &str = "No comment";

impl MockAnswerGenerator {
    pub fn answer_for(question: &Question) -> Answer {
        if is_personal(&question.text) {
            return Answer::skip(question.id);
        }

        let first = question
            .options
            .first()
            .map(|option| OptionRef::new(option.id as i64, &option.text));

        match (question.question_type, first) {
            (QuestionType::Checkbox, Some(record)) => Answer::multiple(question.id, vec![record]),
            (QuestionType::MultipleChoice | QuestionType::Dropdown, Some(record)) => {
                Answer::single(question.id, record)
            }
            (QuestionType::ShortAnswer | QuestionType::Paragraph, _) => {
                Answer::single(question.id, OptionRef::new(0, MOCK_TEXT_ANSWER))
            }
            _ => Answer::skip(question.id),
        }
    }
}

impl AnswerGenerator for MockAnswerGenerator {
    fn generate(&self, snapshot: &FormSnapshot, tracer: &TraceLogger) -> Result<Vec<Answer>, FormError> {
        if snapshot.questions.is_empty() {
            return Err(FormError::Generator(NO_QUESTIONS.into()));
        }

        let answers: Vec<Answer> = snapshot.questions.iter().map(Self::answer_for).collect();
        tracer.log(
            TraceEvent::now(Phase::Generate, "mock_answers", Outcome::Applied)
                .with_detail(format!("answers={}", answers.len())),
        );
        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::answer_model::AnswerValue;
    use crate::form::form_model::FormOption;

    fn question(id: usize, text: &str, question_type: QuestionType, options: &[&str]) -> Question {
        Question {
            id,
            text: text.to_string(),
            question_type,
            required: false,
            options: options
                .iter()
                .enumerate()
                .map(|(i, t)| FormOption::new(i, *t))
                .collect(),
            image: None,
        }
    }

    #[test]
    fn personal_hints_match_whole_words() {
        assert!(is_personal("Your full name"));
        assert!(is_personal("E-mail address"));
        assert!(!is_personal("Favourite language"));
        assert!(!is_personal("How many pages?"));
    }

    #[test]
    fn json_array_is_taken_from_surrounding_prose() {
        let questions = vec![question(0, "Color", QuestionType::MultipleChoice, &["Red", "Blue"])];
        let reply = "Sure! Here you go:\n[{\"questionId\": 0, \"answer\": {\"id\": 1, \"answer\": \"Blue\"}}]\nThanks";

        let parsed = parse_answers(reply, &questions);

        assert_eq!(parsed.source, AnswerSource::Json);
        assert_eq!(parsed.answers, vec![Answer::single(0, OptionRef::new(1, "Blue"))]);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn fallback_matches_options_by_containment() {
        let questions = vec![
            question(0, "Color", QuestionType::MultipleChoice, &["Red", "Deep Blue"]),
            question(1, "Why?", QuestionType::ShortAnswer, &[]),
            question(2, "Name", QuestionType::ShortAnswer, &[]),
            question(3, "Size", QuestionType::Dropdown, &["S", "M"]),
        ];
        let reply = "Question 1: answer: \"blue\"\nQuestion 2: answer: \"Because\"\nQuestion 3: answer: \"SKIP\"";

        let parsed = parse_answers(reply, &questions);
        let answers = &parsed.answers;

        assert_eq!(parsed.source, AnswerSource::Fallback);
        assert_eq!(answers[0], Answer::single(0, OptionRef::new(1, "Deep Blue")));
        assert_eq!(answers[1], Answer::single(1, OptionRef::new(0, "Because")));
        assert_eq!(answers[2].answer, AnswerValue::Skip);
        assert_eq!(answers[3].answer, AnswerValue::Skip);
    }

    #[test]
    fn malformed_entry_only_loses_itself() {
        let questions = vec![
            question(0, "Color", QuestionType::MultipleChoice, &["Red", "Blue"]),
            question(1, "Age of the universe", QuestionType::ShortAnswer, &[]),
            question(2, "Size", QuestionType::Dropdown, &["S", "M"]),
        ];
        let reply = r#"[
            {"questionId": 0, "answer": {"id": 1, "text": "Blue", "answer": "Blue"}},
            {"questionId": 1, "answer": 21},
            {"questionId": "third", "answer": "M"}
        ]"#;

        let parsed = parse_answers(reply, &questions);

        assert_eq!(parsed.source, AnswerSource::Json);
        assert_eq!(
            parsed.answers,
            vec![
                Answer::single(0, OptionRef::new(1, "Blue")),
                Answer::single(1, OptionRef::text_only("21")),
            ]
        );
        assert_eq!(parsed.rejected.len(), 1);
        assert!(parsed.rejected[0].starts_with("entry 2"));
    }

    #[test]
    fn array_without_any_readable_entry_falls_back() {
        let questions = vec![question(0, "Color", QuestionType::MultipleChoice, &["Red", "Blue"])];
        let reply = "[{\"questionId\": \"x\"}]\nQuestion 1: answer: \"red\"";

        let parsed = parse_answers(reply, &questions);

        assert_eq!(parsed.source, AnswerSource::Fallback);
        assert_eq!(parsed.answers, vec![Answer::single(0, OptionRef::new(0, "Red"))]);
        assert_eq!(parsed.rejected.len(), 1);
    }
}
