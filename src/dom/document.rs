use std::collections::{BTreeSet, HashMap};

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::dom::selectors::NATIVE_TOGGLE;
use crate::form::error::FormError;

/// Document-order index of an element. Stable for the lifetime of a `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeKey(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    Change,
    Input,
    Focus,
    Blur,
    MouseDown,
    MouseUp,
}

/// A synthetic event delivered to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomEvent {
    pub target: NodeKey,
    pub kind: EventKind,
    pub bubbles: bool,
}

/// Final state of one control the page saw touched, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlState {
    pub key: NodeKey,
    pub element: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "selectedIndex", skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,
    pub events: Vec<EventKind>,
}

/// A parsed page plus the live control state a browser would keep for it.
///
/// The markup itself is immutable; `checked`, `value`, `selectedIndex` and focus
/// live in an overlay keyed by `NodeKey`, and every dispatched event is kept in
/// order so callers can observe what the page's listeners would have received.
pub struct Document {
    html: Html,
    /// Element node ids in document order; a `NodeKey` indexes this list.
    nodes: Vec<NodeId>,
    keys: HashMap<NodeId, NodeKey>,
    url: Option<String>,
    checked: HashMap<NodeKey, bool>,
    values: HashMap<NodeKey, String>,
    selected: HashMap<NodeKey, usize>,
    focused: Option<NodeKey>,
    events: Vec<DomEvent>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let html = Html::parse_document(html);
        let nodes: Vec<NodeId> = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .map(|el| el.id())
            .collect();
        let keys = nodes
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, NodeKey(index)))
            .collect();

        Self {
            html,
            nodes,
            keys,
            url: None,
            checked: HashMap::new(),
            values: HashMap::new(),
            selected: HashMap::new(),
            focused: None,
            events: Vec::new(),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, FormError> {
        let content = std::fs::read_to_string(path).map_err(|e| FormError::Io {
            path: path.to_string(),
            source: e,
        })?;
        Ok(Self::parse(&content))
    }

    /// Download a page and parse it. Only the server-rendered markup is seen.
    pub fn fetch(url: &str) -> Result<Self, FormError> {
        let body = reqwest::blocking::get(url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| FormError::Http {
                context: format!("GET {}", url),
                source: e,
            })?;
        Ok(Self::parse(&body).with_url(url))
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// `querySelectorAll` against the whole document.
    pub fn select_all(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.html.select(selector).collect()
    }

    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// Key of an element of this document.
    pub fn key_of(&self, el: ElementRef<'_>) -> Option<NodeKey> {
        self.keys.get(&el.id()).copied()
    }

    pub fn element(&self, key: NodeKey) -> Option<ElementRef<'_>> {
        let id = self.nodes.get(key.0)?;
        self.html.tree.get(*id).and_then(ElementRef::wrap)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn require(&self, key: NodeKey) -> Result<ElementRef<'_>, FormError> {
        self.element(key)
            .ok_or_else(|| FormError::NodeMissing(format!("element #{}", key.0)))
    }

    pub fn require_key(&self, el: ElementRef<'_>) -> Result<NodeKey, FormError> {
        self.key_of(el)
            .ok_or_else(|| FormError::NodeMissing(describe(el)))
    }

    // ---- Control state ----

    pub fn is_checked(&self, key: NodeKey) -> bool {
        if let Some(checked) = self.checked.get(&key) {
            return *checked;
        }
        self.element(key)
            .is_some_and(|el| el.value().attr("checked").is_some())
    }

    pub fn set_checked(&mut self, key: NodeKey, checked: bool) -> Result<(), FormError> {
        let el = self.require(key)?;
        if !is_native_toggle(el) {
            return Err(FormError::NodeMissing(format!(
                "{} is not a radio or checkbox input",
                describe(el)
            )));
        }
        let group = radio_group_name(el);
        if let (true, Some(name)) = (checked, group) {
            for sibling in self.radio_group(&name) {
                self.checked.insert(sibling, false);
            }
        }
        self.checked.insert(key, checked);
        Ok(())
    }

    /// Keys of every radio input sharing `name`.
    fn radio_group(&self, name: &str) -> Vec<NodeKey> {
        self.select_all(&NATIVE_TOGGLE)
            .into_iter()
            .filter(|other| {
                other.value().attr("type") == Some("radio") && other.value().attr("name") == Some(name)
            })
            .filter_map(|other| self.key_of(other))
            .collect()
    }

    pub fn value(&self, key: NodeKey) -> Option<String> {
        if let Some(value) = self.values.get(&key) {
            return Some(value.clone());
        }
        let el = self.element(key)?;
        match el.value().name() {
            "textarea" => Some(text_content(el)),
            "input" => Some(el.value().attr("value").unwrap_or_default().to_string()),
            _ => None,
        }
    }

    pub fn set_value(&mut self, key: NodeKey, value: &str) -> Result<(), FormError> {
        let el = self.require(key)?;
        if !matches!(el.value().name(), "input" | "textarea") {
            return Err(FormError::NodeMissing(format!(
                "{} does not hold a text value",
                describe(el)
            )));
        }
        self.values.insert(key, value.to_string());
        Ok(())
    }

    pub fn option_count(&self, key: NodeKey) -> usize {
        self.element(key)
            .map(|el| el.select(&crate::dom::selectors::SELECT_OPTION).count())
            .unwrap_or(0)
    }

    pub fn selected_index(&self, key: NodeKey) -> Option<usize> {
        if let Some(index) = self.selected.get(&key) {
            return Some(*index);
        }
        let el = self.element(key)?;
        if el.value().name() != "select" {
            return None;
        }
        let options: Vec<_> = el.select(&crate::dom::selectors::SELECT_OPTION).collect();
        if options.is_empty() {
            return None;
        }
        Some(
            options
                .iter()
                .position(|opt| opt.value().attr("selected").is_some())
                .unwrap_or(0),
        )
    }

    pub fn set_selected_index(&mut self, key: NodeKey, index: usize) -> Result<(), FormError> {
        let el = self.require(key)?;
        if el.value().name() != "select" {
            return Err(FormError::NodeMissing(format!(
                "{} is not a select element",
                describe(el)
            )));
        }
        let len = self.option_count(key);
        if index >= len {
            return Err(FormError::InvalidSelection { index, len });
        }
        self.selected.insert(key, index);
        Ok(())
    }

    // ---- Events ----

    pub fn dispatch(&mut self, key: NodeKey, kind: EventKind) -> Result<(), FormError> {
        self.require(key)?;
        self.events.push(DomEvent {
            target: key,
            kind,
            bubbles: true,
        });
        Ok(())
    }

    pub fn dispatch_all(&mut self, key: NodeKey, kinds: &[EventKind]) -> Result<(), FormError> {
        for kind in kinds {
            self.dispatch(key, *kind)?;
        }
        Ok(())
    }

    /// Click with the browser's default activation for native radio/checkbox inputs.
    pub fn click(&mut self, key: NodeKey) -> Result<(), FormError> {
        let el = self.require(key)?;
        let input_type = el.value().attr("type").map(|t| t.to_ascii_lowercase());
        let is_input = el.value().name() == "input";
        let group = radio_group_name(el);

        self.dispatch(key, EventKind::Click)?;

        if !is_input {
            return Ok(());
        }
        match input_type.as_deref() {
            Some("checkbox") => {
                let next = !self.is_checked(key);
                self.checked.insert(key, next);
            }
            Some("radio") => {
                if let Some(name) = group {
                    for sibling in self.radio_group(&name) {
                        self.checked.insert(sibling, false);
                    }
                }
                self.checked.insert(key, true);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn focus(&mut self, key: NodeKey) -> Result<(), FormError> {
        self.require(key)?;
        self.focused = Some(key);
        Ok(())
    }

    pub fn focused(&self) -> Option<NodeKey> {
        self.focused
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    pub fn events_for(&self, key: NodeKey) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|event| event.target == key)
            .map(|event| event.kind)
            .collect()
    }

    /// Every control whose state was written or that received an event.
    pub fn touched_controls(&self) -> Vec<ControlState> {
        let keys: BTreeSet<NodeKey> = self
            .checked
            .keys()
            .chain(self.values.keys())
            .chain(self.selected.keys())
            .copied()
            .chain(self.events.iter().map(|event| event.target))
            .collect();

        keys.into_iter()
            .filter_map(|key| {
                let el = self.element(key)?;
                Some(ControlState {
                    key,
                    element: describe(el),
                    checked: is_native_toggle(el).then(|| self.is_checked(key)),
                    value: self.values.get(&key).cloned(),
                    selected_index: self.selected.get(&key).copied(),
                    events: self.events_for(key),
                })
            })
            .collect()
    }
}

// ============================================================================
// Element helpers
// ============================================================================

/// `textContent` of an element.
pub fn text_content(el: ElementRef<'_>) -> String {
    el.text().collect()
}

pub fn trimmed_text(el: ElementRef<'_>) -> String {
    text_content(el).trim().to_string()
}

/// Nearest inclusive ancestor matching `selector`.
pub fn closest<'a>(el: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    if selector.matches(&el) {
        return Some(el);
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| selector.matches(ancestor))
}

pub fn is_ancestor_of(ancestor: ElementRef<'_>, el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|candidate| candidate == ancestor)
}

/// Drop elements nested inside another element of the same list.
pub fn outermost<'a>(elements: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
    elements
        .iter()
        .copied()
        .filter(|el| !elements.iter().any(|other| other != el && is_ancestor_of(*other, *el)))
        .collect()
}

fn radio_group_name(el: ElementRef<'_>) -> Option<String> {
    let is_radio = el.value().name() == "input"
        && el.value().attr("type").is_some_and(|t| t.eq_ignore_ascii_case("radio"));
    is_radio.then(|| el.value().attr("name").map(str::to_string)).flatten()
}

pub fn is_native_toggle(el: ElementRef<'_>) -> bool {
    el.value().name() == "input"
        && matches!(
            el.value().attr("type").map(|t| t.to_ascii_lowercase()).as_deref(),
            Some("radio") | Some("checkbox")
        )
}

/// Short CSS-like description used in logs and reports.
pub fn describe(el: ElementRef<'_>) -> String {
    let value = el.value();
    let mut out = value.name().to_string();
    if let Some(id) = value.attr("id") {
        out.push('#');
        out.push_str(id);
    }
    if let Some(class) = value.classes().next() {
        out.push('.');
        out.push_str(class);
    }
    for attr in ["type", "name", "role"] {
        if let Some(v) = value.attr(attr) {
            out.push_str(&format!("[{}={}]", attr, v));
        }
    }
    out
}
