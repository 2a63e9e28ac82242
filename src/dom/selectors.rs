//! CSS selector families the host renderer has shipped over time.
//!
//! Every query the extractor and the replayer make goes through these statics so
//! both passes look at exactly the same nodes.

use once_cell::sync::Lazy;
use scraper::Selector;

fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {:?}: {:?}", css, e))
}

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub static $name: Lazy<Selector> = Lazy::new(|| compile($css));
    };
}

// ---- Form header ----
selector!(
    FORM_TITLE,
    ".freebirdFormviewerViewHeaderTitle, .F9yp7e, .ikZYwf, .LgNcQe"
);
selector!(FORM_DESCRIPTION, ".freebirdFormviewerViewHeaderDescription");
selector!(PAGE_HEADING, "h1");
selector!(DOCUMENT_TITLE, "title");
selector!(META_DESCRIPTION, "meta[name=\"description\"]");

// ---- Question containers, one family per renderer generation ----
selector!(
    PRIMARY_CONTAINER,
    ".freebirdFormviewerViewNumberedItemContainer, .m3kCof, [role=\"list\"] > [role=\"listitem\"]"
);
selector!(
    LEGACY_CONTAINER,
    "[role=\"listitem\"], .freebirdFormviewerViewNumberedItemContainer"
);
selector!(GENERIC_CONTAINER, ".geS5n, .o3Dpx, .Qr7Oae, .m2RWDe");

// ---- Question title ----
selector!(
    QUESTION_TITLE,
    ".freebirdFormviewerViewItemsItemItemTitle, .m7w28, [role=\"heading\"], .freebirdFormviewerComponentsQuestionBaseTitle, .M0HnIe, .z6Bv3b"
);

// ---- Required markers ----
selector!(REQUIRED_ARIA, "[aria-label=\"Required question\"]");
selector!(
    REQUIRED_MARKER,
    ".freebirdFormviewerViewItemsItemRequiredAsterisk, .vnumgf"
);

// ---- Control counts used by the classifier ----
selector!(RADIO, "input[type=\"radio\"], [role=\"radio\"]");
selector!(CHECKBOX, "input[type=\"checkbox\"], [role=\"checkbox\"]");
selector!(TEXT_INPUT, "input[type=\"text\"], textarea");
selector!(SELECT_LIKE, "select, [role=\"listbox\"], .vRMGwf");
selector!(DROPDOWN_MARKER, ".MocG8c, .OA0qNb, [role=\"listbox\"]");
selector!(
    ANY_CONTROL,
    "input, textarea, select, [role=\"radio\"], [role=\"checkbox\"], [role=\"listbox\"]"
);

// ---- Option labels ----
selector!(
    OPTION_LABEL,
    ".docssharedWizToggleLabeledLabelText, .ulDsOb, [role=\"radio\"], [role=\"checkbox\"], .nWQGrd, .oyXaNc"
);
selector!(FALLBACK_OPTION_LABEL, ".d7L4fc, label span, .jgvuAb");
selector!(
    TOGGLE,
    "input[type=\"radio\"], input[type=\"checkbox\"], [role=\"radio\"], [role=\"checkbox\"]"
);
selector!(
    NATIVE_TOGGLE,
    "input[type=\"radio\"], input[type=\"checkbox\"]"
);
selector!(LABEL, "label");

// ---- Dropdowns ----
selector!(NATIVE_SELECT, "select");
selector!(SELECT_OPTION, "option");
selector!(
    CUSTOM_DROPDOWN_OPTION,
    ".OA0qNb > [role=\"option\"], .MocG8c, .vRMGwf option, [role=\"listbox\"] [role=\"option\"]"
);
selector!(
    OPENED_DROPDOWN_OPTION,
    ".OA0qNb > [role=\"option\"], .MocG8c [role=\"option\"], .vRMGwf option, [role=\"listbox\"] [role=\"option\"]"
);
selector!(LISTBOX, "[role=\"listbox\"]");
selector!(LISTBOX_OPTION, "[role=\"option\"], option");
selector!(
    DROPDOWN_TRIGGER,
    ".MocG8c, .OA0qNb, [role=\"listbox\"], .vRMGwf"
);
selector!(DROPDOWN_CONTROL, "[role=\"listbox\"], select, .vRMGwf");
selector!(LABELLED_ELEMENT, "[aria-label], [title]");

// ---- Misc ----
selector!(IMAGE, "img");
selector!(
    FORM_PROBE,
    "form, [role=\"form\"], .freebirdFormviewerViewFormCard, .m3kCof"
);
