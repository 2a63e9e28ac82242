use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::dom::document::Document;
use crate::extract::discovery::Discovery;
use crate::form::answer_model::{Answer, find_answer};
use crate::form::classifier::classify_container;
use crate::form::error::FormError;
use crate::form::form_model::QuestionType;
use crate::replay::handlers::{PlanContext, plan_checkbox, plan_dropdown, plan_multiple_choice, plan_text};
use crate::replay::scheduler::{Clock, ManualClock, Scheduler, SystemClock};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Outcome, Phase, TraceEvent};

/// Delays between replay steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Offset of each control's first step.
    #[serde(with = "millis", rename = "control_delay_ms")]
    pub control_delay: Duration,
    /// Wait after opening a custom dropdown before looking for its options.
    #[serde(with = "millis", rename = "dropdown_open_delay_ms")]
    pub dropdown_open_delay: Duration,
    /// Wait after finding an option before clicking it.
    #[serde(with = "millis", rename = "option_click_delay_ms")]
    pub option_click_delay: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            control_delay: Duration::from_millis(100),
            dropdown_open_delay: Duration::from_millis(200),
            option_click_delay: Duration::from_millis(50),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Writes answers back into a document's controls.
///
/// Containers are rediscovered and reclassified with the same rules extraction
/// uses, so question ids line up with the snapshot the answers were made for.
pub struct Replayer {
    discovery: Discovery,
    config: ReplayConfig,
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new(Discovery::standard(), ReplayConfig::default())
    }
}

impl Replayer {
    pub fn new(discovery: Discovery, config: ReplayConfig) -> Self {
        Self { discovery, config }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Schedule every control's interaction, then drain the queue on `clock`.
    ///
    /// Failures are logged per control and never abort the rest of the form.
    pub fn replay(&self, doc: &mut Document, answers: &[Answer], clock: &mut dyn Clock, tracer: &TraceLogger) {
        let mut scheduler = match self.plan(doc, answers, tracer) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                tracer.log(TraceEvent::now(Phase::Replay, "discover", Outcome::Failed).with_detail(e));
                return;
            }
        };

        scheduler.run(doc, clock, tracer);
    }

    /// Resolve every answered container's controls and queue their steps.
    pub fn plan(&self, doc: &Document, answers: &[Answer], tracer: &TraceLogger) -> Result<Scheduler, FormError> {
        let form = self.discovery.discover(doc)?;
        let container_keys = form
            .containers
            .iter()
            .map(|container| doc.require_key(*container))
            .collect::<Result<Vec<_>, _>>()?;

        let mut scheduler = Scheduler::new();

        for (index, container) in form.containers.iter().enumerate() {
            let question_type = classify_container(*container).question_type;
            let skip = |reason: &str| {
                tracer.log(
                    TraceEvent::now(Phase::Replay, "question", Outcome::Skipped)
                        .with_question(index)
                        .with_type(question_type)
                        .with_detail(reason),
                );
            };

            let Some(answer) = find_answer(answers, index) else {
                skip("no answer");
                continue;
            };
            if answer.answer.is_skip() {
                skip("answer is SKIP");
                continue;
            }

            let records = answer.answer.records();
            let ctx = PlanContext {
                question_id: index,
                question_type,
                config: self.config.clone(),
                containers: container_keys.clone(),
                tracer,
            };

            let planned = match question_type {
                QuestionType::MultipleChoice => {
                    plan_multiple_choice(doc, *container, &records, &ctx, &mut scheduler)
                }
                QuestionType::Checkbox => plan_checkbox(doc, *container, &records, &ctx, &mut scheduler),
                QuestionType::Dropdown => plan_dropdown(doc, *container, &records, &ctx, &mut scheduler),
                QuestionType::ShortAnswer | QuestionType::Paragraph => {
                    plan_text(doc, *container, &records, &ctx, &mut scheduler)
                }
                QuestionType::Unknown => {
                    skip("no handler for unknown type");
                    Ok(())
                }
            };

            if let Err(e) = planned {
                tracer.log(
                    TraceEvent::now(Phase::Replay, "question", Outcome::Failed)
                        .with_question(index)
                        .with_type(question_type)
                        .with_detail(e),
                );
            }
        }

        Ok(scheduler)
    }
}

/// Replay with default settings and no tracing, without real waiting.
pub fn replay(doc: &mut Document, answers: &[Answer]) {
    Replayer::default().replay(doc, answers, &mut ManualClock::default(), &TraceLogger::disabled());
}

/// Replay with default settings, sleeping for real between steps.
pub fn replay_live(doc: &mut Document, answers: &[Answer], tracer: &TraceLogger) {
    Replayer::default().replay(doc, answers, &mut SystemClock, tracer);
}
