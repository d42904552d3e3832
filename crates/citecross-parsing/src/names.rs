use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use citecross_core::Subject;

use crate::config::ParsingConfig;

/// `Nome` label followed by the rest of the line.
static CANONICAL_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Nome\s+([^\n]+)").unwrap());

/// Citation-name block of a Lattes CV, up to the `Lattes iD` label.
/// The label itself may be broken across lines.
static CITATION_NAMES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Nome em citações\s+bibliográficas\s+(.*?)\s+Lattes iD").unwrap()
});

/// Names recovered from one subject document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNames {
    pub canonical_name: Option<String>,
    pub citation_variants: BTreeSet<String>,
}

impl ParsedNames {
    /// Convert into a [`Subject`]; `None` unless both the name and at least
    /// one variant were found.
    pub fn into_subject(self) -> Option<Subject> {
        let name = self.canonical_name?;
        Subject::new(name, self.citation_variants)
    }
}

/// Extracts the canonical name and citation variants from CV text.
#[derive(Debug, Clone, Default)]
pub struct NameParser {
    config: ParsingConfig,
}

impl NameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    pub fn parse(&self, text: &str) -> ParsedNames {
        ParsedNames {
            canonical_name: self.canonical_name(text),
            citation_variants: self.citation_variants(text),
        }
    }

    /// First `Nome <rest of line>` match, trimmed.
    pub fn canonical_name(&self, text: &str) -> Option<String> {
        let re = self
            .config
            .canonical_name_re
            .as_ref()
            .unwrap_or(&CANONICAL_NAME_RE);
        let name = re.captures(text)?.get(1)?.as_str().trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// Citation variants from the first citation-name block; empty if absent.
    pub fn citation_variants(&self, text: &str) -> BTreeSet<String> {
        let re = self
            .config
            .citation_names_re
            .as_ref()
            .unwrap_or(&CITATION_NAMES_RE);
        let Some(block) = re.captures(text).and_then(|c| c.get(1)) else {
            return BTreeSet::new();
        };

        let joined = block.as_str().replace(['\r', '\n'], " ");
        joined
            .split(self.config.variant_separator.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }
}
