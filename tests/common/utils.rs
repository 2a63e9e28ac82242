use form_pilot::dom::document::{Document, NodeKey};
use scraper::Selector;

pub fn fixture_path(name: &str) -> String {
    let base = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    base.join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}

pub fn fixture(name: &str) -> Document {
    Document::from_file(&fixture_path(name)).expect("fixture should load")
}

/// Key of the first element matching `css`.
pub fn key(doc: &Document, css: &str) -> NodeKey {
    let selector = Selector::parse(css).expect("test selector");
    let el = doc.select_first(&selector).expect("element present");
    doc.key_of(el).expect("element has a key")
}

/// Keys of every element matching `css`, in document order.
pub fn keys(doc: &Document, css: &str) -> Vec<NodeKey> {
    let selector = Selector::parse(css).expect("test selector");
    doc.select_all(&selector)
        .into_iter()
        .filter_map(|el| doc.key_of(el))
        .collect()
}
