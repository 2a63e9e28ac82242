use scraper::ElementRef;

use crate::dom::document::{Document, text_content, trimmed_text};
use crate::dom::selectors::{IMAGE, QUESTION_TITLE, REQUIRED_ARIA, REQUIRED_MARKER};
use crate::extract::discovery::Discovery;
use crate::extract::options::harvest_options;
use crate::extract::repair::{force_dropdowns, promote_rating_scales};
use crate::form::classifier::classify_container;
use crate::form::error::FormError;
use crate::form::form_model::{FormSnapshot, Question};
use crate::form::normalize::guess_question_text;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Outcome, Phase, TraceEvent};

/// Scrapes a document into a `FormSnapshot`.
pub struct Extractor {
    discovery: Discovery,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Discovery::standard())
    }
}

impl Extractor {
    pub fn new(discovery: Discovery) -> Self {
        Self { discovery }
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Never fails: an internal error becomes an error snapshot with no questions.
    pub fn extract(&self, doc: &Document, tracer: &TraceLogger) -> FormSnapshot {
        match self.try_extract(doc, tracer) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracer.log(
                    TraceEvent::now(Phase::Extract, "extract", Outcome::Failed).with_detail(&e),
                );
                FormSnapshot::error(e)
            }
        }
    }

    pub fn try_extract(&self, doc: &Document, tracer: &TraceLogger) -> Result<FormSnapshot, FormError> {
        let form = self.discovery.discover(doc)?;
        tracer.log(
            TraceEvent::now(Phase::Extract, "discover", Outcome::Info).with_detail(format!(
                "strategy={} containers={}",
                form.strategy,
                form.containers.len()
            )),
        );

        let mut questions: Vec<Question> = form
            .containers
            .iter()
            .enumerate()
            .map(|(index, container)| build_question(*container, index))
            .collect();

        for id in promote_rating_scales(&form.containers, &mut questions) {
            tracer.log(
                TraceEvent::now(Phase::Extract, "repair_rating_scale", Outcome::Applied)
                    .with_question(id),
            );
        }
        for id in force_dropdowns(doc, &form.containers, &mut questions) {
            tracer.log(
                TraceEvent::now(Phase::Extract, "repair_dropdown", Outcome::Applied)
                    .with_question(id),
            );
        }

        for question in &questions {
            tracer.log(
                TraceEvent::now(Phase::Extract, "question", Outcome::Info)
                    .with_question(question.id)
                    .with_type(question.question_type)
                    .with_detail(format!("{} options", question.options.len())),
            );
        }

        Ok(FormSnapshot {
            title: form.title,
            description: form.description,
            questions,
        })
    }
}

/// Build the question record for the container at `index`.
pub fn build_question(container: ElementRef<'_>, index: usize) -> Question {
    let full_text = text_content(container);
    let classification = classify_container(container);

    Question {
        id: index,
        text: question_text(container, &full_text, index),
        question_type: classification.question_type,
        required: is_required(container, &full_text),
        options: harvest_options(container, &classification),
        image: image_url(container),
    }
}

/// Title element text, else the numbered-prefix guess, else "Question N".
pub fn question_text(container: ElementRef<'_>, full_text: &str, index: usize) -> String {
    container
        .select(&QUESTION_TITLE)
        .next()
        .map(trimmed_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| guess_question_text(full_text.trim(), index))
}

pub fn is_required(container: ElementRef<'_>, full_text: &str) -> bool {
    container.select(&REQUIRED_ARIA).next().is_some()
        || full_text.contains('*')
        || container.select(&REQUIRED_MARKER).next().is_some()
}

/// Source of the first image in the container, verbatim.
pub fn image_url(container: ElementRef<'_>) -> Option<String> {
    container
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
        .filter(|src| !src.is_empty())
}

/// Extract with the standard strategy list and no tracing.
pub fn extract(doc: &Document) -> FormSnapshot {
    Extractor::default().extract(doc, &TraceLogger::disabled())
}

/// Image of the question at `question_id`, if its container has one.
pub fn question_image(doc: &Document, question_id: usize) -> Option<String> {
    let form = Discovery::standard().discover(doc).ok()?;
    form.containers.get(question_id).and_then(|c| image_url(*c))
}

/// `(question_id, image_url)` for every question container with an image.
pub fn form_images(doc: &Document) -> Vec<(usize, String)> {
    Discovery::standard()
        .discover(doc)
        .map(|form| {
            form.containers
                .iter()
                .enumerate()
                .filter_map(|(id, container)| image_url(*container).map(|url| (id, url)))
                .collect()
        })
        .unwrap_or_default()
}
