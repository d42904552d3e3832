use thiserror::Error;

pub mod config;
pub mod names;

pub use config::{ParsingConfig, ParsingConfigBuilder};
pub use names::{NameParser, ParsedNames};
// Re-export domain types from core (canonical definitions live there)
pub use citecross_core::Subject;

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("invalid {field} pattern: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("{field} pattern must have a capture group")]
    MissingCaptureGroup { field: &'static str },
    #[error("variant separator must not be empty")]
    EmptySeparator,
}

/// Parse a subject document's text with the default patterns.
///
/// Returns `None` when the text lacks the `Nome` field or the citation-name
/// block, which excludes the document from the registry.
pub fn parse_subject(text: &str) -> Option<Subject> {
    NameParser::new().parse(text).into_subject()
}
