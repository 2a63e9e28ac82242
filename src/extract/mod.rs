pub mod discovery;
pub mod extractor;
pub mod options;
pub mod repair;
