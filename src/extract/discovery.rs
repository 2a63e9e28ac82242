use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use crate::dom::document::{Document, outermost, trimmed_text};
use crate::dom::selectors::{
    ANY_CONTROL, DOCUMENT_TITLE, FORM_DESCRIPTION, FORM_TITLE, GENERIC_CONTAINER,
    LEGACY_CONTAINER, META_DESCRIPTION, PAGE_HEADING, PRIMARY_CONTAINER, QUESTION_TITLE,
};
use crate::form::error::FormError;

// ============================================================================
// DiscoveryStrategy trait: one renderer generation per implementation
// ============================================================================

/// Finds question containers for one generation of the host renderer's markup.
pub trait DiscoveryStrategy {
    fn name(&self) -> &'static str;

    /// Containers in document order. Empty means "not this generation".
    fn containers<'a>(&self, doc: &'a Document) -> Result<Vec<ElementRef<'a>>, FormError>;

    /// Title and description as this generation renders them.
    fn header(&self, doc: &Document) -> (String, String) {
        (
            first_text(doc, &FORM_TITLE).unwrap_or_default(),
            first_text(doc, &FORM_DESCRIPTION).unwrap_or_default(),
        )
    }
}

fn first_text(doc: &Document, selector: &Selector) -> Option<String> {
    doc.select_first(selector)
        .map(trimmed_text)
        .filter(|text| !text.is_empty())
}

/// Container family matched by one selector list, optionally filtered on what
/// each container must hold.
pub struct SelectorStrategy {
    name: &'static str,
    selector: &'static Lazy<Selector>,
    require_title: bool,
    require_control: bool,
    page_header_fallback: bool,
}

impl SelectorStrategy {
    /// Current markup: numbered item containers or list items of the form list.
    pub fn primary() -> Self {
        Self {
            name: "primary",
            selector: &PRIMARY_CONTAINER,
            require_title: false,
            require_control: false,
            page_header_fallback: false,
        }
    }

    /// Older markup: any list item, kept only when it carries a question title.
    pub fn legacy() -> Self {
        Self {
            name: "legacy",
            selector: &LEGACY_CONTAINER,
            require_title: true,
            require_control: false,
            page_header_fallback: false,
        }
    }

    /// Minimal strategy: a heading plus some control underneath it.
    pub fn generic() -> Self {
        Self {
            name: "generic",
            selector: &GENERIC_CONTAINER,
            require_title: true,
            require_control: true,
            page_header_fallback: true,
        }
    }
}

impl DiscoveryStrategy for SelectorStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn containers<'a>(&self, doc: &'a Document) -> Result<Vec<ElementRef<'a>>, FormError> {
        let candidates: Vec<ElementRef<'a>> = doc
            .select_all(self.selector)
            .into_iter()
            .filter(|c| !self.require_title || c.select(&QUESTION_TITLE).next().is_some())
            .filter(|c| !self.require_control || c.select(&ANY_CONTROL).next().is_some())
            .collect();
        Ok(outermost(candidates))
    }

    fn header(&self, doc: &Document) -> (String, String) {
        let mut title = first_text(doc, &FORM_TITLE);
        let mut description = first_text(doc, &FORM_DESCRIPTION);

        if self.page_header_fallback {
            title = title
                .or_else(|| first_text(doc, &PAGE_HEADING))
                .or_else(|| first_text(doc, &DOCUMENT_TITLE));
            description = description.or_else(|| {
                doc.select_first(&META_DESCRIPTION)
                    .and_then(|meta| meta.value().attr("content"))
                    .map(|content| content.trim().to_string())
                    .filter(|content| !content.is_empty())
            });
        }

        (title.unwrap_or_default(), description.unwrap_or_default())
    }
}

// ============================================================================
// Discovery: ordered strategy list
// ============================================================================

/// Containers found by the first strategy that matched anything.
pub struct DiscoveredForm<'a> {
    pub strategy: &'static str,
    pub title: String,
    pub description: String,
    pub containers: Vec<ElementRef<'a>>,
}

pub struct Discovery {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::standard()
    }
}

impl Discovery {
    /// Primary, then legacy, then generic.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(SelectorStrategy::primary()),
            Box::new(SelectorStrategy::legacy()),
            Box::new(SelectorStrategy::generic()),
        ])
    }

    pub fn new(strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order; the first with at least one container wins.
    /// When none match, the first strategy's header is returned with no containers.
    pub fn discover<'a>(&self, doc: &'a Document) -> Result<DiscoveredForm<'a>, FormError> {
        for strategy in &self.strategies {
            let containers = strategy.containers(doc)?;
            if !containers.is_empty() {
                let (title, description) = strategy.header(doc);
                return Ok(DiscoveredForm {
                    strategy: strategy.name(),
                    title,
                    description,
                    containers,
                });
            }
        }

        let (title, description) = self
            .strategies
            .first()
            .map(|s| s.header(doc))
            .unwrap_or_default();

        Ok(DiscoveredForm {
            strategy: "none",
            title,
            description,
            containers: vec![],
        })
    }
}
