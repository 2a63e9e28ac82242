use crate::dom::document::Document;
use crate::extract::extractor::Extractor;
use crate::form::answer_model::Answer;
use crate::form::error::FormError;
use crate::form::form_model::FormSnapshot;
use crate::form::normalize::snapshot_fingerprint;
use crate::generator::answer_generator::{AnswerGenerator, MockAnswerGenerator, NO_QUESTIONS};
use crate::replay::replayer::Replayer;
use crate::replay::scheduler::Clock;
use crate::screen::trigger::should_extract;
use crate::session::cache::SessionCache;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Outcome, Phase, TraceEvent};

/// Scan, answer, fill: the three user-facing steps over one cached form.
pub struct FormPilot {
    extractor: Extractor,
    generator: Box<dyn AnswerGenerator>,
    replayer: Replayer,
    cache: SessionCache,
    tracer: TraceLogger,
}

impl FormPilot {
    pub fn new(
        extractor: Extractor,
        generator: Box<dyn AnswerGenerator>,
        replayer: Replayer,
        tracer: TraceLogger,
    ) -> Self {
        Self {
            extractor,
            generator,
            replayer,
            cache: SessionCache::new(),
            tracer,
        }
    }

    /// Default extraction and replay with the rule-based generator.
    pub fn with_mock() -> Self {
        Self::new(
            Extractor::default(),
            Box::new(MockAnswerGenerator),
            Replayer::default(),
            TraceLogger::disabled(),
        )
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SessionCache {
        &mut self.cache
    }

    pub fn tracer(&self) -> &TraceLogger {
        &self.tracer
    }

    /// Extract the page's form and remember it. Snapshots without questions are
    /// returned but not cached.
    pub fn scan(&mut self, url: Option<&str>, doc: &Document) -> Result<FormSnapshot, FormError> {
        if !should_extract(url, doc) {
            return Err(FormError::Discovery(format!(
                "no form detected at {}",
                url.unwrap_or("<unknown url>")
            )));
        }

        let snapshot = self.extractor.extract(doc, &self.tracer);
        if !snapshot.questions.is_empty() {
            self.cache.store_form(url, snapshot.clone());
        }
        Ok(snapshot)
    }

    /// Generate answers for the cached form. A failure clears any earlier answers.
    pub fn generate(&mut self) -> Result<Vec<Answer>, FormError> {
        let snapshot = match self.cache.entry() {
            Some(entry) => entry.form_data.clone(),
            None => return Err(FormError::Generator(NO_QUESTIONS.into())),
        };

        match self.generator.generate(&snapshot, &self.tracer) {
            Ok(answers) => {
                self.cache.store_answers(answers.clone())?;
                Ok(answers)
            }
            Err(e) => {
                self.cache.clear_answers();
                self.tracer.log(
                    TraceEvent::now(Phase::Generate, "generate", Outcome::Failed).with_detail(&e),
                );
                Err(e)
            }
        }
    }

    /// Replay the cached answers, refusing if the document's form no longer
    /// matches the one they were generated for.
    pub fn fill(&self, doc: &mut Document, clock: &mut dyn Clock) -> Result<(), FormError> {
        let entry = self
            .cache
            .entry()
            .ok_or_else(|| FormError::Generator("no form scanned yet".into()))?;
        if entry.answers.is_empty() {
            return Err(FormError::Generator("no answers to fill".into()));
        }

        let current = snapshot_fingerprint(&self.extractor.extract(doc, &TraceLogger::disabled()));
        if current != entry.fingerprint {
            return Err(FormError::StaleSnapshot {
                expected: entry.fingerprint.clone(),
                actual: current,
            });
        }

        self.replayer.replay(doc, &entry.answers, clock, &self.tracer);
        Ok(())
    }
}
