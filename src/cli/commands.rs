use serde::Serialize;

use crate::cli::config::{GeneratorKind, ResolvedGenerator};
use crate::dom::document::{ControlState, Document, DomEvent};
use crate::extract::extractor::Extractor;
use crate::form::answer_model::Answer;
use crate::form::error::FormError;
use crate::generator::answer_generator::{AnswerGenerator, LlmAnswerGenerator, MockAnswerGenerator};
use crate::generator::backend::{GeminiBackend, OllamaBackend};
use crate::replay::replayer::{ReplayConfig, Replayer};
use crate::replay::scheduler::{Clock, ManualClock, SystemClock};
use crate::screen::trigger::should_extract;
use crate::session::pipeline::FormPilot;
use crate::trace::logger::TraceLogger;

// ============================================================================
// extract subcommand
// ============================================================================

pub fn cmd_extract(
    html: Option<&str>,
    url: Option<&str>,
    verbose: u8,
    tracer: &TraceLogger,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(html, url)?;

    if verbose > 0 {
        eprintln!("Extracting form from {}...", source_name(html, url));
    }

    let snapshot = Extractor::default().extract(&doc, tracer);
    if verbose > 0 {
        eprintln!("Found {} questions", snapshot.questions.len());
    }

    println!("{}", to_json(&snapshot)?);
    Ok(())
}

// ============================================================================
// answer subcommand
// ============================================================================

pub fn cmd_answer(
    html: Option<&str>,
    url: Option<&str>,
    generator: &ResolvedGenerator,
    verbose: u8,
    tracer: &TraceLogger,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(html, url)?;
    let snapshot = Extractor::default().extract(&doc, tracer);

    if verbose > 0 {
        eprintln!(
            "Generating answers for {} questions with {:?}...",
            snapshot.questions.len(),
            generator.kind
        );
    }

    let answers = build_generator(generator)?.generate(&snapshot, tracer)?;
    println!("{}", to_json(&answers)?);
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

/// Replay output: every event the page received and the controls left touched.
#[derive(Debug, Serialize)]
pub struct FillReport {
    pub events: Vec<DomEvent>,
    pub controls: Vec<ControlState>,
}

impl FillReport {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            events: doc.events().to_vec(),
            controls: doc.touched_controls(),
        }
    }
}

pub fn cmd_fill(
    html: &str,
    answers_path: &str,
    replay: &ReplayConfig,
    live: bool,
    verbose: u8,
    tracer: &TraceLogger,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::from_file(html)?;
    let answers = read_answers(answers_path)?;

    if verbose > 0 {
        eprintln!("Replaying {} answers into {}...", answers.len(), html);
    }

    let replayer = Replayer::new(Default::default(), replay.clone());
    replayer.replay(&mut doc, &answers, clock(live).as_mut(), tracer);

    println!("{}", to_json(&FillReport::from_document(&doc))?);
    Ok(())
}

// ============================================================================
// autofill subcommand
// ============================================================================

pub fn cmd_autofill(
    html: Option<&str>,
    url: Option<&str>,
    generator: &ResolvedGenerator,
    replay: &ReplayConfig,
    live: bool,
    verbose: u8,
    tracer: TraceLogger,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = load_document(html, url)?;
    let page_url = url.or(doc.url()).map(str::to_string);

    if !should_extract(page_url.as_deref(), &doc) {
        eprintln!("No form detected in {}", source_name(html, url));
        return Ok(());
    }

    let mut pilot = FormPilot::new(
        Extractor::default(),
        build_generator(generator)?,
        Replayer::new(Default::default(), replay.clone()),
        tracer,
    );

    let snapshot = pilot.scan(page_url.as_deref(), &doc)?;
    if verbose > 0 {
        eprintln!("Scanned '{}' ({} questions)", snapshot.title, snapshot.questions.len());
    }

    let answers = pilot.generate()?;
    if verbose > 0 {
        let skipped = answers.iter().filter(|a| a.answer.is_skip()).count();
        eprintln!("Generated {} answers ({} skipped)", answers.len(), skipped);
    }

    pilot.fill(&mut doc, clock(live).as_mut())?;
    println!("{}", to_json(&FillReport::from_document(&doc))?);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a page from a local file or fetch it.
pub fn load_document(html: Option<&str>, url: Option<&str>) -> Result<Document, FormError> {
    match (html, url) {
        (Some(path), Some(url)) => Ok(Document::from_file(path)?.with_url(url)),
        (Some(path), None) => Document::from_file(path),
        (None, Some(url)) => Document::fetch(url),
        (None, None) => Err(FormError::Discovery("either --html or --url is required".into())),
    }
}

/// Build the answer generator for the resolved settings.
pub fn build_generator(settings: &ResolvedGenerator) -> Result<Box<dyn AnswerGenerator>, FormError> {
    match settings.kind {
        GeneratorKind::Mock => Ok(Box::new(MockAnswerGenerator)),
        GeneratorKind::Ollama => {
            let defaults = OllamaBackend::default();
            let backend = OllamaBackend::new(
                settings.endpoint.as_deref().unwrap_or(&defaults.endpoint),
                settings.model.as_deref().unwrap_or(&defaults.model),
            );
            Ok(Box::new(LlmAnswerGenerator::new(Box::new(backend))))
        }
        GeneratorKind::Gemini => {
            let key = settings
                .api_key
                .as_deref()
                .ok_or_else(|| FormError::Generator("Gemini needs an API key (GOOGLE_API_KEY)".into()))?;
            let mut backend = GeminiBackend::new(key);
            if let Some(model) = &settings.model {
                backend = backend.with_model(model);
            }
            if let Some(endpoint) = &settings.endpoint {
                backend.endpoint = endpoint.clone();
            }
            Ok(Box::new(LlmAnswerGenerator::new(Box::new(backend))))
        }
    }
}

pub fn read_answers(path: &str) -> Result<Vec<Answer>, FormError> {
    let content = std::fs::read_to_string(path).map_err(|e| FormError::Io {
        path: path.to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| FormError::JsonParse {
        context: format!("answers file {}", path),
        source: e,
    })
}

fn clock(live: bool) -> Box<dyn Clock> {
    if live {
        Box::new(SystemClock)
    } else {
        Box::new(ManualClock::default())
    }
}

fn source_name<'a>(html: Option<&'a str>, url: Option<&'a str>) -> &'a str {
    html.or(url).unwrap_or("<none>")
}

fn to_json<T: Serialize>(value: &T) -> Result<String, FormError> {
    serde_json::to_string_pretty(value).map_err(|e| FormError::JsonSerialize {
        context: std::any::type_name::<T>().to_string(),
        source: e,
    })
}
