pub mod document;
pub mod selectors;
