use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::document::Document;
use crate::dom::selectors::FORM_PROBE;

/// Hosts that always carry a form.
const FORM_HOSTS: [&str; 4] = [
    "forms.google.com",
    "forms.office.com",
    "forms.microsoft.com",
    "docs.google.com/forms",
];

static FORM_URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"docs\.google\.com/.*/forms/.*",
        r"docs\.google\.com/.*/viewform.*",
        r"forms\.gle/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid form url pattern"))
    .collect()
});

/// Whether the page address belongs to a known form host.
pub fn is_form_url(url: &str) -> bool {
    FORM_HOSTS.iter().any(|host| url.contains(host))
        || FORM_URL_PATTERNS.iter().any(|pattern| pattern.is_match(url))
}

/// Whether the document looks like it hosts a form, whatever its address.
pub fn has_form_markup(doc: &Document) -> bool {
    doc.select_first(&FORM_PROBE).is_some()
}

/// Run extraction on a known form URL, or on any page with form markup.
pub fn should_extract(url: Option<&str>, doc: &Document) -> bool {
    url.is_some_and(is_form_url) || has_form_markup(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_form_hosts() {
        assert!(is_form_url("https://docs.google.com/forms/d/e/abc/viewform"));
        assert!(is_form_url("https://docs.google.com/a/example.com/forms/d/abc"));
        assert!(is_form_url("https://forms.gle/AbCdEf"));
        assert!(is_form_url("https://forms.office.com/r/xyz"));
        assert!(!is_form_url("https://example.com/contact"));
        assert!(!is_form_url("https://docs.google.com/document/d/abc"));
    }

    #[test]
    fn markup_probe_fallback() {
        let with_form = Document::parse("<div role=\"form\"><input></div>");
        let without = Document::parse("<p>hello</p>");

        assert!(should_extract(Some("https://example.com"), &with_form));
        assert!(!should_extract(Some("https://example.com"), &without));
        assert!(should_extract(Some("https://forms.gle/x"), &without));
        assert!(!should_extract(None, &without));
    }
}
