use std::fmt;

#[derive(Debug)]
pub enum FormError {
    /// HTTP request to a model backend or page URL failed
    Http { context: String, source: reqwest::Error },

    /// JSON parsing failed (answers file, model response, config)
    JsonParse { context: String, source: serde_json::Error },

    /// JSON serialization failed
    JsonSerialize { context: String, source: serde_json::Error },

    /// Reading or writing a local file failed
    Io { path: String, source: std::io::Error },

    /// The answer generator could not produce answers (quota, empty form, bad response)
    Generator(String),

    /// A node that was located earlier is no longer addressable
    NodeMissing(String),

    /// A control was asked to select an index outside its option range
    InvalidSelection { index: usize, len: usize },

    /// Cached answers were produced for a different form structure
    StaleSnapshot { expected: String, actual: String },

    /// A discovery strategy failed while walking the document
    Discovery(String),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Http { context, source } => {
                write!(f, "HTTP error ({}): {}", context, source)
            }
            FormError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            FormError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            FormError::Io { path, source } => {
                write!(f, "I/O error on '{}': {}", path, source)
            }
            FormError::Generator(msg) => {
                write!(f, "Answer generation failed: {}", msg)
            }
            FormError::NodeMissing(what) => {
                write!(f, "Node not found: {}", what)
            }
            FormError::InvalidSelection { index, len } => {
                write!(f, "Selection index {} out of range (0..{})", index, len)
            }
            FormError::StaleSnapshot { expected, actual } => {
                write!(
                    f,
                    "Form structure changed since answers were generated (expected {}, found {})",
                    expected, actual
                )
            }
            FormError::Discovery(msg) => {
                write!(f, "Container discovery failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormError::Http { source, .. } => Some(source),
            FormError::JsonParse { source, .. } => Some(source),
            FormError::JsonSerialize { source, .. } => Some(source),
            FormError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
